//! Emits the C++ declaration (`.h`) and definition (`.cc`) surfaces for a
//! checked module.
//!
//! The generated code decodes and encodes structs against a byte-addressable
//! `core::MemoryRegion` in their original big-endian layout. Decode offsets
//! are sums of a literal static base plus the runtime sizes of any preceding
//! dynamically sized members; encode walks a running `total_offset`. The two
//! are inverses by construction.

use std::io::{self, Write};

use itertools::Itertools;

use crate::core::{ArrayLen, Base, Member, MemberType, Module, StructDef, SymbolTable, Type};
use crate::reporting::{CodegenMessage, Message};

const HEADER_INCLUDES: &[&str] = &[
    "<cstdint>",
    "<ostream>",
    "<string>",
    "\"gen/typegen/typegen_prelude.h\"",
    "\"absl/status/statusor.h\"",
    "\"core/memory_region.h\"",
];

const SOURCE_INCLUDES: &[&str] = &[
    "\"core/endian_helpers.h\"",
    "\"core/status_helpers.h\"",
    "\"emu/memory/memory_map.h\"",
];

fn read_prototype(name: &str) -> String {
    format!(
        "template<> absl::StatusOr<{name}> ReadType(const core::MemoryRegion& region, size_t offset)"
    )
}

fn write_prototype(name: &str) -> String {
    format!(
        "template<> absl::Status WriteType(const {name}& obj, core::MemoryRegion& region, size_t offset)"
    )
}

/// The C++ type a resolved type reference renders as. Integer scalars render
/// as their fixed-width base so aliases of them stay trivially copyable;
/// everything else goes through its written name (and its `using`
/// declaration, if it is an alias).
fn c_type(r#type: &Type) -> String {
    match &r#type.base {
        Base::U8 => "uint8_t".to_owned(),
        Base::U16 => "uint16_t".to_owned(),
        Base::U24 => "uint24_t".to_owned(),
        Base::U32 => "uint32_t".to_owned(),
        Base::I16 => "int16_t".to_owned(),
        Base::I32 => "int32_t".to_owned(),
        Base::Str if r#type.name == "str" => "std::string".to_owned(),
        _ => r#type.name.clone(),
    }
}

fn member_c_type(r#type: &MemberType) -> String {
    match r#type {
        MemberType::Scalar(r#type) => c_type(r#type),
        MemberType::Array(array) => format!("std::vector<{}>", c_type(&array.element)),
    }
}

/// `window_manager` becomes `WindowManager`.
fn snake_to_camel(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// The static base plus any accumulated runtime terms, each prefixed (with
/// `obj.` inside `ReadType`, bare inside `size()`).
fn offset_expr(offset: u32, offset_vars: &[String], prefix: &str) -> String {
    if offset_vars.is_empty() {
        offset.to_string()
    } else {
        format!(
            "{} + {}",
            offset,
            offset_vars
                .iter()
                .map(|var| format!("{prefix}{var}"))
                .join(" + ")
        )
    }
}

/// How one member renders in the `operator<<` output.
fn stream_value(member: &Member) -> String {
    let value = format!("obj.{}", member.name);
    match &member.r#type {
        MemberType::Array(array) => {
            format!("\"[{};\" << {value}.size() << \"]\"", array.element.name)
        }
        MemberType::Scalar(r#type) => match &r#type.base {
            Base::U8 => match r#type.user_size {
                Some(size) => format!("\"u8[{size}]\""),
                // Print as an integer so a u8 is not interpreted as a char
                // (a zero byte would truncate the stream as a terminator).
                None => format!("int({value})"),
            },
            Base::Bool => format!("({value} ? \"True\" : \"False\")"),
            Base::OSType => format!("OSTypeName({value})"),
            Base::Ptr | Base::Handle => format!("std::hex << \"0x\" << {value} << std::dec"),
            Base::Str => format!("\"\\\"\" << {value} << \"\\\"\""),
            Base::Enum => format!("static_cast<uint32_t>({value})"),
            _ => value,
        },
    }
}

pub struct Context<'a> {
    table: &'a SymbolTable,
    module: &'a Module,
    /// Types whose size could not be resolved, in first-use order.
    unresolved: Vec<String>,
}

impl<'a> Context<'a> {
    pub fn new(table: &'a SymbolTable, module: &'a Module) -> Context<'a> {
        Context {
            table,
            module,
            unresolved: Vec::new(),
        }
    }

    /// The generation errors accumulated while emitting.
    pub fn finish(self) -> Vec<Message> {
        self.unresolved
            .into_iter()
            .map(|name| CodegenMessage::UnresolvedSize { name }.into())
            .collect()
    }

    fn report_unresolved(&mut self, name: &str) {
        if !self.unresolved.iter().any(|unresolved| unresolved == name) {
            self.unresolved.push(name.to_owned());
        }
    }

    /// The static byte size of a scalar type. Array aliases have none; they
    /// are reported and sized as zero so emission can continue and surface
    /// every unresolved type in one run.
    fn static_size(&mut self, r#type: &Type) -> u32 {
        if r#type.base == Base::Array {
            self.report_unresolved(&r#type.name);
            0
        } else {
            r#type.size
        }
    }

    /// The byte width of the first scalar decoded for an element, matching
    /// [`Context::first_scalar_c_type`]. This is the width of the zero
    /// sentinel terminating a null-terminated array.
    fn first_scalar_size(&mut self, r#type: &Type) -> u32 {
        match &r#type.base {
            Base::Str => 1,
            Base::Struct(name) => {
                let first = self
                    .table
                    .struct_members(name)
                    .and_then(|members| members.first())
                    .cloned();
                match first {
                    Some(Member {
                        r#type: MemberType::Scalar(inner),
                        ..
                    }) => self.first_scalar_size(&inner),
                    _ => {
                        self.report_unresolved(r#type.name.as_str());
                        1
                    }
                }
            }
            _ => self.static_size(r#type),
        }
    }

    /// The C++ type of the first scalar decoded for an element, used as the
    /// sentinel read of a null-terminated array. Struct elements recurse
    /// into their first member.
    fn first_scalar_c_type(&mut self, r#type: &Type) -> String {
        match &r#type.base {
            Base::Str => "uint8_t".to_owned(),
            Base::Enum => "uint32_t".to_owned(),
            Base::Struct(name) => {
                let first = self
                    .table
                    .struct_members(name)
                    .and_then(|members| members.first())
                    .cloned();
                match first {
                    Some(Member {
                        r#type: MemberType::Scalar(inner),
                        ..
                    }) => self.first_scalar_c_type(&inner),
                    _ => {
                        self.report_unresolved(r#type.name.as_str());
                        "uint8_t".to_owned()
                    }
                }
            }
            _ => c_type(r#type),
        }
    }

    pub fn emit_header(&mut self, writer: &mut impl Write, stem: &str) -> io::Result<()> {
        let module = self.module;

        writeln!(writer, "#pragma once")?;
        writeln!(writer)?;
        for include in HEADER_INCLUDES {
            writeln!(writer, "#include {include}")?;
        }
        writeln!(writer)?;

        for path in &module.includes {
            writeln!(writer, "#include \"{path}.h\"")?;
        }
        if !module.includes.is_empty() {
            writeln!(writer)?;
        }

        for item in &module.items {
            if let crate::core::Item::Alias(alias) = item {
                writeln!(
                    writer,
                    "using {} = {};",
                    alias.name,
                    member_c_type(&alias.r#type)
                )?;
            }
        }
        writeln!(writer)?;

        for item in &module.items {
            if let crate::core::Item::Enum(r#enum) = item {
                writeln!(writer, "enum class {} {{", r#enum.name)?;
                for (name, value) in &r#enum.values {
                    writeln!(writer, "  {name} = {value},")?;
                }
                writeln!(writer, "}};")?;
            }
        }
        writeln!(writer)?;

        for item in &module.items {
            if let crate::core::Item::Struct(r#struct) = item {
                self.emit_offsets(writer, r#struct)?;
                self.emit_struct(writer, r#struct)?;
            }
        }
        writeln!(writer)?;

        for item in &module.items {
            if let crate::core::Item::Struct(r#struct) = item {
                writeln!(writer, "{};", read_prototype(&r#struct.name))?;
                writeln!(writer, "{};", write_prototype(&r#struct.name))?;
            }
        }
        writeln!(writer)?;

        for item in &module.items {
            if let crate::core::Item::Struct(r#struct) = item {
                writeln!(
                    writer,
                    "std::ostream& operator<<(std::ostream&, const {}&);",
                    r#struct.name
                )?;
            }
        }

        self.emit_trap_interface(writer, stem)
    }

    /// The static offset table of a fixed-layout struct, used by emulator
    /// code that pokes at raw memory without decoding the whole struct.
    fn emit_offsets(&mut self, writer: &mut impl Write, r#struct: &StructDef) -> io::Result<()> {
        if r#struct.is_dynamic {
            return Ok(());
        }

        writeln!(writer, "namespace {}Fields {{", r#struct.name)?;
        for member in &r#struct.members {
            writeln!(
                writer,
                "  const static size_t {} = {:#x};",
                member.name, member.offset
            )?;
        }
        writeln!(writer, "}}  // namespace {}Fields", r#struct.name)?;
        writeln!(writer)?;
        Ok(())
    }

    fn emit_struct(&mut self, writer: &mut impl Write, r#struct: &StructDef) -> io::Result<()> {
        writeln!(writer, "struct {} {{", r#struct.name)?;
        for member in &r#struct.members {
            match &member.r#type {
                MemberType::Scalar(r#type) => match (&r#type.base, r#type.user_size) {
                    (Base::U8, Some(size)) => {
                        writeln!(writer, "  uint8_t {}[{}];", member.name, size)?;
                    }
                    (Base::Struct(_) | Base::Str | Base::Array, _) => {
                        writeln!(writer, "  {} {};", c_type(r#type), member.name)?;
                    }
                    (Base::Enum, _) => {
                        writeln!(writer, "  {} {}{{}};", c_type(r#type), member.name)?;
                    }
                    _ => {
                        writeln!(writer, "  {} {}{{0}};", c_type(r#type), member.name)?;
                    }
                },
                MemberType::Array(_) => {
                    writeln!(writer, "  {} {};", member_c_type(&member.r#type), member.name)?;
                }
            }
        }

        if !r#struct.is_dynamic {
            writeln!(writer)?;
            writeln!(writer, "  const static size_t fixed_size = {};", r#struct.size)?;
        }
        writeln!(writer)?;
        writeln!(writer, "  size_t size() const;")?;
        writeln!(writer, "}};")?;
        writeln!(writer)?;
        Ok(())
    }

    /// One abstract class per file of trap signatures, named after the
    /// output file stem. Emitted only when the file declares traps.
    fn emit_trap_interface(&mut self, writer: &mut impl Write, stem: &str) -> io::Result<()> {
        let module = self.module;
        let traps: Vec<_> = module
            .items
            .iter()
            .filter_map(|item| match item {
                crate::core::Item::Trap(trap) => Some(trap),
                _ => None,
            })
            .collect();
        if traps.is_empty() {
            return Ok(());
        }

        let class_name = snake_to_camel(stem);
        writeln!(writer)?;
        writeln!(writer, "namespace gen {{")?;
        writeln!(writer, "class {class_name} {{")?;
        writeln!(writer, " public:")?;
        writeln!(writer, "  virtual ~{class_name}() = default;")?;
        for trap in traps {
            let arguments = trap
                .arguments
                .iter()
                .map(|argument| format!("{} {}", member_c_type(&argument.r#type), argument.name))
                .join(", ");
            let return_type = match &trap.return_type {
                Some(r#type) => format!("absl::StatusOr<{}>", member_c_type(r#type)),
                None => "void".to_owned(),
            };
            writeln!(
                writer,
                "  virtual {} {}({}) = 0;",
                return_type, trap.name, arguments
            )?;
        }
        writeln!(writer, "}};")?;
        writeln!(writer, "}}  // namespace gen")?;
        Ok(())
    }

    pub fn emit_source(&mut self, writer: &mut impl Write, stem: &str) -> io::Result<()> {
        let module = self.module;

        writeln!(writer, "#include \"{stem}.h\"")?;
        writeln!(writer)?;
        for include in SOURCE_INCLUDES {
            writeln!(writer, "#include {include}")?;
        }
        writeln!(writer)?;

        for path in &module.includes {
            writeln!(writer, "#include \"{path}.h\"")?;
        }
        if !module.includes.is_empty() {
            writeln!(writer)?;
        }

        for item in &module.items {
            if let crate::core::Item::Struct(r#struct) = item {
                self.emit_read_type(writer, r#struct)?;
                self.emit_write_type(writer, r#struct)?;
            }
        }
        writeln!(writer)?;

        for item in &module.items {
            if let crate::core::Item::Struct(r#struct) = item {
                self.emit_stream(writer, r#struct)?;
            }
        }
        Ok(())
    }

    fn emit_read_type(&mut self, writer: &mut impl Write, r#struct: &StructDef) -> io::Result<()> {
        writeln!(writer, "{} {{", read_prototype(&r#struct.name))?;
        writeln!(writer, "  struct {} obj;", r#struct.name)?;

        // Static bytes consumed so far, runtime terms for preceding strings
        // and nested structs, and loop-local widths for preceding arrays.
        let mut offset: u32 = 0;
        let mut offset_vars: Vec<String> = Vec::new();
        let mut local_vars: Vec<String> = Vec::new();

        for member in &r#struct.members {
            let mut at = format!("offset + {}", offset_expr(offset, &offset_vars, "obj."));
            if !local_vars.is_empty() {
                at = format!("{} + {}", at, local_vars.join(" + "));
            }

            match &member.r#type {
                MemberType::Scalar(r#type) => match (&r#type.base, r#type.user_size) {
                    (Base::Str, _) => {
                        writeln!(
                            writer,
                            "  obj.{} = TRY(ReadType<{}>(region, {}));",
                            member.name,
                            c_type(r#type),
                            at
                        )?;
                        offset_vars.push(format!("{}.size() + 1", member.name));
                    }
                    (Base::Struct(_), _) => {
                        writeln!(
                            writer,
                            "  obj.{} = TRY(ReadType<{}>(region, {}));",
                            member.name,
                            c_type(r#type),
                            at
                        )?;
                        offset_vars.push(format!("{}.size()", member.name));
                    }
                    (Base::U24, _) => {
                        writeln!(writer, "  obj.{} = TRY(CopyU24(region, {}));", member.name, at)?;
                        offset += 3;
                    }
                    (Base::U8, Some(size)) => {
                        writeln!(
                            writer,
                            "  RETURN_IF_ERROR(region.ReadRaw(obj.{}, {}, {}));",
                            member.name, at, size
                        )?;
                        offset += size;
                    }
                    (Base::Enum, _) => {
                        writeln!(
                            writer,
                            "  obj.{} = static_cast<{}>(TRY(region.Read<uint32_t>({})));",
                            member.name,
                            c_type(r#type),
                            at
                        )?;
                        offset += 4;
                    }
                    _ => {
                        writeln!(
                            writer,
                            "  obj.{} = TRY(region.Read<{}>({}));",
                            member.name,
                            c_type(r#type),
                            at
                        )?;
                        offset += self.static_size(r#type);
                    }
                },
                MemberType::Array(array) => {
                    let element = c_type(&array.element);
                    writeln!(writer, "  size_t {}_offset = 0;", member.name)?;
                    match &array.length {
                        ArrayLen::NullTerminated => {
                            let sentinel = self.first_scalar_c_type(&array.element);
                            writeln!(
                                writer,
                                "  while (TRY(region.Read<{}>({} + {}_offset)) != 0) {{",
                                sentinel, at, member.name
                            )?;
                        }
                        ArrayLen::Counted { field, inclusive } => {
                            let bound = if *inclusive { "<=" } else { "<" };
                            writeln!(
                                writer,
                                "  for (size_t i = 0; i {} obj.{}; ++i) {{",
                                bound, field
                            )?;
                        }
                    }

                    if array.element.is_struct() {
                        writeln!(
                            writer,
                            "    auto inner_obj = TRY(ReadType<{}>(region, {} + {}_offset));",
                            element, at, member.name
                        )?;
                        writeln!(writer, "    obj.{}.push_back(inner_obj);", member.name)?;
                        writeln!(
                            writer,
                            "    {}_offset += inner_obj.size();",
                            member.name
                        )?;
                    } else if array.element.base == Base::Enum {
                        writeln!(
                            writer,
                            "    obj.{}.push_back(static_cast<{}>(TRY(region.Read<uint32_t>({} + {}_offset))));",
                            member.name, element, at, member.name
                        )?;
                        writeln!(writer, "    {}_offset += 4;", member.name)?;
                    } else {
                        // Advance by the checked width, not sizeof: the
                        // uint24_t alias is four bytes wide in C++ while the
                        // element occupies three.
                        let element_size = self.static_size(&array.element);
                        writeln!(
                            writer,
                            "    obj.{}.push_back(TRY(region.Read<{}>({} + {}_offset)));",
                            member.name, element, at, member.name
                        )?;
                        writeln!(writer, "    {}_offset += {};", member.name, element_size)?;
                    }
                    writeln!(writer, "  }}")?;
                    if let ArrayLen::NullTerminated = array.length {
                        // Later members land past the terminating zero.
                        let sentinel_size = self.first_scalar_size(&array.element);
                        writeln!(writer, "  {}_offset += {};", member.name, sentinel_size)?;
                    }
                    local_vars.push(format!("{}_offset", member.name));
                }
            }
        }

        writeln!(writer, "  return obj;")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;

        // size() re-derives the same arithmetic without the `obj.` prefix;
        // array widths are recomputed from the decoded vectors.
        writeln!(writer, "size_t {}::size() const {{", r#struct.name)?;
        let mut size_vars: Vec<String> = Vec::new();
        for member in &r#struct.members {
            if let MemberType::Array(array) = &member.r#type {
                if array.element.is_struct() {
                    writeln!(writer, "  size_t {}_offset = 0;", member.name)?;
                    writeln!(
                        writer,
                        "  for (size_t i = 0; i < {}.size(); ++i) {{",
                        member.name
                    )?;
                    writeln!(writer, "    {0}_offset += {0}[i].size();", member.name)?;
                    writeln!(writer, "  }}")?;
                    size_vars.push(format!("{}_offset", member.name));
                } else {
                    let element_size = self.static_size(&array.element);
                    size_vars.push(format!("({}.size() * {})", member.name, element_size));
                }
                if let ArrayLen::NullTerminated = array.length {
                    let sentinel_size = self.first_scalar_size(&array.element);
                    size_vars.push(sentinel_size.to_string());
                }
            }
        }
        let mut size = offset_expr(offset, &offset_vars, "");
        if !size_vars.is_empty() {
            size = format!("{} + {}", size, size_vars.join(" + "));
        }
        writeln!(writer, "  return {size};")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;
        Ok(())
    }

    fn emit_write_type(&mut self, writer: &mut impl Write, r#struct: &StructDef) -> io::Result<()> {
        writeln!(writer, "{} {{", write_prototype(&r#struct.name))?;
        writeln!(writer, "  size_t total_offset = offset;")?;

        for member in &r#struct.members {
            match &member.r#type {
                MemberType::Scalar(r#type) => {
                    let value = format!("obj.{}", member.name);
                    self.emit_write_value(writer, r#type, &value, "  ")?;
                }
                MemberType::Array(array) => {
                    writeln!(writer, "  for (const auto& item : obj.{}) {{", member.name)?;
                    self.emit_write_value(writer, &array.element, "item", "    ")?;
                    writeln!(writer, "  }}")?;
                    if let ArrayLen::NullTerminated = array.length {
                        // The decoder stops at a zero, so encode one.
                        let sentinel = self.first_scalar_c_type(&array.element);
                        let sentinel_size = self.first_scalar_size(&array.element);
                        writeln!(
                            writer,
                            "  RETURN_IF_ERROR(region.Write<{sentinel}>(total_offset, 0));"
                        )?;
                        writeln!(writer, "  total_offset += {sentinel_size};")?;
                    }
                }
            }
        }

        writeln!(writer, "  return absl::OkStatus();")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;
        Ok(())
    }

    fn emit_write_value(
        &mut self,
        writer: &mut impl Write,
        r#type: &Type,
        value: &str,
        indent: &str,
    ) -> io::Result<()> {
        match (&r#type.base, r#type.user_size) {
            (Base::Str, _) => {
                // The length byte precedes the payload.
                writeln!(
                    writer,
                    "{}RETURN_IF_ERROR(WriteType<{}>({}, region, total_offset));",
                    indent,
                    c_type(r#type),
                    value
                )?;
                writeln!(writer, "{}total_offset += 1 + {}.size();", indent, value)?;
            }
            (Base::Struct(_), _) => {
                writeln!(
                    writer,
                    "{}RETURN_IF_ERROR(WriteType<{}>({}, region, total_offset));",
                    indent,
                    c_type(r#type),
                    value
                )?;
                writeln!(writer, "{}total_offset += {}.size();", indent, value)?;
            }
            (Base::U24, _) => {
                writeln!(
                    writer,
                    "{}RETURN_IF_ERROR(WriteU24({}, region, total_offset));",
                    indent, value
                )?;
                writeln!(writer, "{}total_offset += 3;", indent)?;
            }
            (Base::U8, Some(size)) => {
                writeln!(
                    writer,
                    "{}RETURN_IF_ERROR(region.WriteRaw({}, total_offset, {}));",
                    indent, value, size
                )?;
                writeln!(writer, "{}total_offset += {};", indent, size)?;
            }
            (Base::Enum, _) => {
                writeln!(
                    writer,
                    "{}RETURN_IF_ERROR(region.Write<uint32_t>(total_offset, static_cast<uint32_t>({})));",
                    indent, value
                )?;
                writeln!(writer, "{}total_offset += 4;", indent)?;
            }
            _ => {
                let size = self.static_size(r#type);
                writeln!(
                    writer,
                    "{}RETURN_IF_ERROR(region.Write<{}>(total_offset, {}));",
                    indent,
                    c_type(r#type),
                    value
                )?;
                writeln!(writer, "{}total_offset += {};", indent, size)?;
            }
        }
        Ok(())
    }

    fn emit_stream(&mut self, writer: &mut impl Write, r#struct: &StructDef) -> io::Result<()> {
        write!(
            writer,
            "std::ostream& operator<<(std::ostream& os, const {}& obj) {{ return os << \"{{ \"",
            r#struct.name
        )?;
        let count = r#struct.members.len();
        for (index, member) in r#struct.members.iter().enumerate() {
            write!(writer, " << \"{}: \" << {}", member.name, stream_value(member))?;
            if index + 1 != count {
                write!(writer, " << \", \"")?;
            }
        }
        writeln!(writer, " << \" }}\"; }}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::FileId;
    use crate::resolve::SourceFile;
    use crate::surface::{elaboration, lexer, parser};

    fn compile(source: &str, includes: &[&str], stem: &str) -> (String, String, Vec<Message>) {
        let file_id = FileId::try_from(1).unwrap();
        let (tokens, messages) = lexer::tokens(file_id, source);
        assert!(messages.is_empty(), "lex errors: {messages:?}");
        let (items, messages) = parser::parse(file_id, source.len(), &tokens);
        assert!(messages.is_empty(), "parse errors: {messages:?}");

        let file = SourceFile {
            file_id,
            path: "test.tdef".to_owned(),
            includes: includes.iter().map(|path| (*path).to_owned()).collect(),
            items,
        };
        let mut table = SymbolTable::new();
        let (module, messages) = elaboration::check_module(&mut table, &file);
        assert!(messages.is_empty(), "check errors: {messages:?}");

        let mut context = Context::new(&table, &module);
        let mut header = Vec::new();
        let mut source_out = Vec::new();
        context.emit_header(&mut header, stem).unwrap();
        context.emit_source(&mut source_out, stem).unwrap();
        (
            String::from_utf8(header).unwrap(),
            String::from_utf8(source_out).unwrap(),
            context.finish(),
        )
    }

    fn compile_ok(source: &str) -> (String, String) {
        let (header, source, messages) = compile(source, &[], "test_types");
        assert!(messages.is_empty(), "codegen errors: {messages:?}");
        (header, source)
    }

    #[test]
    fn fixed_struct_header_has_offsets_and_fixed_size() {
        let (header, _) = compile_ok("struct Point { x: i16; y: i16; }");

        assert!(header.contains("#pragma once"));
        assert!(header.contains("namespace PointFields {"));
        assert!(header.contains("  const static size_t x = 0x0;"));
        assert!(header.contains("  const static size_t y = 0x2;"));
        assert!(header.contains("struct Point {"));
        assert!(header.contains("  int16_t x{0};"));
        assert!(header.contains("  const static size_t fixed_size = 4;"));
        assert!(header.contains("  size_t size() const;"));
        assert!(header.contains(
            "template<> absl::StatusOr<Point> ReadType(const core::MemoryRegion& region, size_t offset);"
        ));
        assert!(header.contains("std::ostream& operator<<(std::ostream&, const Point&);"));
    }

    #[test]
    fn fixed_struct_reads_at_static_offsets() {
        let (_, source) = compile_ok("struct Point { x: i16; y: i16; }");

        assert!(source.contains("obj.x = TRY(region.Read<int16_t>(offset + 0));"));
        assert!(source.contains("obj.y = TRY(region.Read<int16_t>(offset + 2));"));
        assert!(source.contains("size_t Point::size() const {\n  return 4;\n}"));
        assert!(source.contains("RETURN_IF_ERROR(region.Write<int16_t>(total_offset, obj.x));"));
    }

    #[test]
    fn string_members_shift_later_offsets_at_runtime() {
        let (header, source) = compile_ok("struct Msg { len: u8; text: str; flag: bool; }");

        // Dynamic structs get no offset table and no fixed_size.
        assert!(!header.contains("namespace MsgFields"));
        assert!(!header.contains("fixed_size"));

        assert!(source.contains("obj.text = TRY(ReadType<std::string>(region, offset + 1));"));
        assert!(source
            .contains("obj.flag = TRY(region.Read<bool>(offset + 1 + obj.text.size() + 1));"));
        assert!(source.contains("  return 2 + text.size() + 1;"));
        assert!(source.contains("RETURN_IF_ERROR(WriteType<std::string>(obj.text, region, total_offset));"));
        assert!(source.contains("total_offset += 1 + obj.text.size();"));
    }

    #[test]
    fn counted_arrays_loop_over_their_bound() {
        let (_, source) =
            compile_ok("struct List { count: u16; items: [u16 < count]; }");

        assert!(source.contains("size_t items_offset = 0;"));
        assert!(source.contains("for (size_t i = 0; i < obj.count; ++i) {"));
        assert!(source
            .contains("obj.items.push_back(TRY(region.Read<uint16_t>(offset + 2 + items_offset)));"));
        assert!(source.contains("items_offset += 2;"));
        assert!(source.contains("  return 2 + (items.size() * 2);"));
    }

    #[test]
    fn inclusive_bounds_use_less_equal() {
        let (_, source) = compile_ok("struct List { count: u16; items: [u16 <= count]; }");
        assert!(source.contains("for (size_t i = 0; i <= obj.count; ++i) {"));
    }

    #[test]
    fn null_terminated_arrays_read_the_first_scalar_as_sentinel() {
        let (_, source) = compile_ok(
            "struct Entry { id: u32; flags: u16; }\nstruct Table { entries: [Entry null]; }",
        );

        assert!(source
            .contains("while (TRY(region.Read<uint32_t>(offset + 0 + entries_offset)) != 0) {"));
        assert!(source.contains("auto inner_obj = TRY(ReadType<Entry>(region, offset + 0 + entries_offset));"));
        assert!(source.contains("entries_offset += inner_obj.size();"));
    }

    #[test]
    fn null_terminated_arrays_encode_and_count_the_sentinel() {
        let (_, source) = compile_ok("struct Table { ids: [u16 null]; }");

        // Decode skips the terminating zero once the loop exits, so a later
        // member would land past it.
        assert!(source.contains("    ids_offset += 2;\n  }\n  ids_offset += 2;"));
        // Encode writes the zero the decoder stops at, and size() counts it.
        assert!(source.contains("RETURN_IF_ERROR(region.Write<uint16_t>(total_offset, 0));"));
        assert!(source.contains("  return 0 + (ids.size() * 2) + 2;"));
    }

    #[test]
    fn null_terminated_struct_arrays_use_the_first_scalar_sentinel_width() {
        let (_, source) = compile_ok(
            "struct Entry { id: u32; flags: u16; }\nstruct Table { entries: [Entry null]; }",
        );

        assert!(source.contains("RETURN_IF_ERROR(region.Write<uint32_t>(total_offset, 0));"));
        assert!(source.contains("  entries_offset += 4;"));
    }

    #[test]
    fn u24_array_elements_advance_their_packed_width() {
        let (_, source) = compile_ok("struct Clock { count: u16; ticks: [u24 < count]; }");

        // uint24_t is four bytes wide in C++; the element occupies three.
        assert!(source.contains("    ticks_offset += 3;"));
        assert!(source.contains("  return 2 + (ticks.size() * 3);"));
    }

    #[test]
    fn byte_buffers_are_raw_copies() {
        let (header, source) = compile_ok("struct Block { data: u8[16]; tail: u8; }");

        assert!(header.contains("  uint8_t data[16];"));
        assert!(source.contains("RETURN_IF_ERROR(region.ReadRaw(obj.data, offset + 0, 16));"));
        assert!(source.contains("obj.tail = TRY(region.Read<uint8_t>(offset + 16));"));
        assert!(source.contains("RETURN_IF_ERROR(region.WriteRaw(obj.data, total_offset, 16));"));
        assert!(source.contains("\"u8[16]\""));
    }

    #[test]
    fn u24_members_use_the_dedicated_helpers() {
        let (_, source) = compile_ok("struct Clock { ticks: u24; rest: u8; }");

        assert!(source.contains("obj.ticks = TRY(CopyU24(region, offset + 0));"));
        assert!(source.contains("obj.rest = TRY(region.Read<uint8_t>(offset + 3));"));
        assert!(source.contains("RETURN_IF_ERROR(WriteU24(obj.ticks, region, total_offset));"));
    }

    #[test]
    fn aliases_become_using_declarations() {
        let (header, source) =
            compile_ok("type WindowPtr: Ptr;\nstruct W { content: WindowPtr; }");

        assert!(header.contains("using WindowPtr = Ptr;"));
        assert!(source.contains("obj.content = TRY(region.Read<WindowPtr>(offset + 0));"));
        assert!(source.contains("std::hex << \"0x\" << obj.content << std::dec"));
    }

    #[test]
    fn enums_are_cast_through_their_underlying_integer() {
        let (header, source) =
            compile_ok("enum Kind { dialog: 2; user: 8; }\nstruct S { kind: Kind; }");

        assert!(header.contains("enum class Kind {"));
        assert!(header.contains("  dialog = 2,"));
        assert!(header.contains("  Kind kind{};"));
        assert!(source.contains("obj.kind = static_cast<Kind>(TRY(region.Read<uint32_t>(offset + 0)));"));
        assert!(source.contains(
            "RETURN_IF_ERROR(region.Write<uint32_t>(total_offset, static_cast<uint32_t>(obj.kind)));"
        ));
        assert!(source.contains("static_cast<uint32_t>(obj.kind)"));
    }

    #[test]
    fn stream_output_wraps_members_in_braces() {
        let (_, source) = compile_ok("struct Msg { len: u8; text: str; ok: bool; }");

        assert!(source.contains(
            "std::ostream& operator<<(std::ostream& os, const Msg& obj) { return os << \"{ \""
        ));
        assert!(source.contains("int(obj.len)"));
        assert!(source.contains("\"\\\"\" << obj.text << \"\\\"\""));
        assert!(source.contains("(obj.ok ? \"True\" : \"False\")"));
        assert!(source.contains("<< \" }\"; }"));
    }

    #[test]
    fn arrays_stream_as_element_and_count() {
        let (_, source) = compile_ok("struct L { count: u16; items: [u16 < count]; }");
        assert!(source.contains("\"[u16;\" << obj.items.size() << \"]\""));
    }

    #[test]
    fn os_types_stream_through_their_name_helper() {
        let (_, source) = compile_ok("struct F { creator: OSType; }");
        assert!(source.contains("OSTypeName(obj.creator)"));
    }

    #[test]
    fn trap_interface_is_named_after_the_output_stem() {
        let (header, _, messages) = compile(
            "struct Rect { top: i16; left: i16; }\ntrap NewWindow(bounds: Rect, title: str): Ptr;\ntrap SysBeep();",
            &[],
            "window_manager",
        );
        assert!(messages.is_empty(), "codegen errors: {messages:?}");

        assert!(header.contains("namespace gen {"));
        assert!(header.contains("class WindowManager {"));
        assert!(header.contains("  virtual ~WindowManager() = default;"));
        assert!(header.contains(
            "  virtual absl::StatusOr<Ptr> NewWindow(Rect bounds, std::string title) = 0;"
        ));
        assert!(header.contains("  virtual void SysBeep() = 0;"));
    }

    #[test]
    fn no_trap_interface_without_traps() {
        let (header, _) = compile_ok("struct Point { x: i16; y: i16; }");
        assert!(!header.contains("namespace gen"));
    }

    #[test]
    fn dependency_includes_map_to_generated_headers() {
        let (header, source, messages) =
            compile("struct S { x: u8; }", &["emu/rect_types"], "test_types");
        assert!(messages.is_empty(), "codegen errors: {messages:?}");

        assert!(header.contains("#include \"emu/rect_types.h\""));
        assert!(source.contains("#include \"test_types.h\""));
        assert!(source.contains("#include \"emu/rect_types.h\""));
    }

    #[test]
    fn array_alias_sizes_are_generation_errors() {
        let (header, _, messages) =
            compile("type Items: [u16 null];\nstruct S { items: Items; }", &[], "test_types");

        assert!(header.contains("using Items = std::vector<uint16_t>;"));
        assert!(matches!(
            &messages[0],
            Message::Codegen(CodegenMessage::UnresolvedSize { name }) if name == "Items"
        ));
    }
}
