//! Checked declarations.
//!
//! This is the output of type checking: every referenced name is resolved,
//! every member carries its static byte offset, and every struct knows its
//! static size and whether any member makes it dynamically sized. The code
//! generator works from this model alone and never sees surface syntax.

use fxhash::{FxHashMap, FxHashSet};

use crate::source::ByteRange;

/// What a resolved type bottoms out at once aliases are followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    U8,
    U16,
    U24,
    U32,
    I16,
    I32,
    Bool,
    OSType,
    /// An emulated memory address. Fixed at four bytes, formatted in hex.
    Ptr,
    /// A double-indirected emulated memory address. Also four bytes.
    Handle,
    /// A length-prefixed string: one length byte followed by the payload.
    Str,
    /// A user-defined struct, named so nested lookups can find its members.
    Struct(String),
    /// A user-defined enum, stored as its underlying 32-bit integer.
    Enum,
    /// An alias whose target is an array type. It has no resolvable static
    /// size; using it where a size is needed is a generation error.
    Array,
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    /// The name as written at the use site. Aliases keep their own name
    /// here so generated code goes through the `using` declaration.
    pub name: String,
    pub base: Base,
    /// Static byte size. Zero for `str` and array aliases, whose size is
    /// only known at runtime.
    pub size: u32,
    pub is_dynamic: bool,
    /// The `N` of a raw byte buffer (`u8[N]`).
    pub user_size: Option<u32>,
}

impl Type {
    /// Look up a builtin by its source-level name.
    pub fn builtin(name: &str) -> Option<Type> {
        let (base, size) = match name {
            "u8" => (Base::U8, 1),
            "u16" => (Base::U16, 2),
            "u24" => (Base::U24, 3),
            "u32" => (Base::U32, 4),
            "i16" => (Base::I16, 2),
            "i32" => (Base::I32, 4),
            "bool" => (Base::Bool, 1),
            "OSType" => (Base::OSType, 4),
            "Ptr" => (Base::Ptr, 4),
            "Handle" => (Base::Handle, 4),
            "str" => (Base::Str, 0),
            _ => return None,
        };

        let is_dynamic = base == Base::Str;
        Some(Type {
            name: name.to_owned(),
            base,
            size,
            is_dynamic,
            user_size: None,
        })
    }

    /// Pointer-like types are formatted in hex rather than as integers.
    pub fn is_reference(&self) -> bool {
        matches!(self.base, Base::Ptr | Base::Handle)
    }

    /// Integer scalars are the only valid counted-array bounds.
    pub fn is_integer(&self) -> bool {
        matches!(
            self.base,
            Base::U8 | Base::U16 | Base::U24 | Base::U32 | Base::I16 | Base::I32
        )
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.base, Base::Struct(_))
    }
}

/// The type of a struct member or trap argument.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberType {
    Scalar(Type),
    Array(ArrayType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub element: Type,
    pub length: ArrayLen,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayLen {
    /// Bounded by a preceding integer member, exclusively or inclusively.
    Counted { field: String, inclusive: bool },
    /// Decoded until the element's first scalar reads as zero.
    NullTerminated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Alias(AliasDef),
    Struct(StructDef),
    Trap(TrapDef),
    Enum(EnumDef),
}

impl Item {
    pub fn name(&self) -> &str {
        match self {
            Item::Alias(item) => &item.name,
            Item::Struct(item) => &item.name,
            Item::Trap(item) => &item.name,
            Item::Enum(item) => &item.name,
        }
    }
}

/// `type <name>: <target>;`
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDef {
    pub name: String,
    pub r#type: MemberType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<Member>,
    /// Sum of the members' static sizes. Meaningful only when the struct is
    /// not dynamic.
    pub size: u32,
    /// True when any member is a string, an array, or a dynamic struct.
    pub is_dynamic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub r#type: MemberType,
    /// Cumulative static offset from the start of the struct. Meaningful
    /// only within a non-dynamic struct.
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrapDef {
    pub name: String,
    pub arguments: Vec<TrapArg>,
    pub return_type: Option<MemberType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrapArg {
    pub name: String,
    pub r#type: MemberType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<(String, u32)>,
}

/// The checked contents of one source file, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Include paths exactly as written, for the generated `#include` lines.
    pub includes: Vec<String>,
    pub items: Vec<Item>,
}

/// A checked global definition together with where it was declared, kept for
/// duplicate-definition reporting.
#[derive(Debug, Clone)]
pub struct Definition {
    pub range: ByteRange,
    pub item: Item,
}

/// The global symbol table.
///
/// Threaded by the driver through every file of a compilation in dependency
/// order, so a file sees exactly the names its includes (and their includes)
/// declared. Append-only: a name, once defined, is never replaced.
#[derive(Default)]
pub struct SymbolTable {
    definitions: FxHashMap<String, Definition>,
    /// Names whose definitions failed to check. References to them resolve
    /// to nothing without reporting a second, derived diagnostic.
    poisoned: FxHashSet<String>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    /// Record a definition. Returns the existing definition's range instead
    /// if the name is already taken.
    pub fn insert(&mut self, name: String, definition: Definition) -> Result<(), ByteRange> {
        match self.definitions.get(&name) {
            Some(existing) => Err(existing.range),
            None => {
                self.definitions.insert(name, definition);
                Ok(())
            }
        }
    }

    pub fn poison(&mut self, name: String) {
        self.poisoned.insert(name);
    }

    pub fn is_poisoned(&self, name: &str) -> bool {
        self.poisoned.contains(name)
    }

    /// The members of the named struct, if the name resolves (through
    /// aliases) to one.
    pub fn struct_members(&self, name: &str) -> Option<&[Member]> {
        match &self.get(name)?.item {
            Item::Struct(r#struct) => Some(&r#struct.members),
            Item::Alias(alias) => match &alias.r#type {
                MemberType::Scalar(Type {
                    base: Base::Struct(target),
                    ..
                }) => self.struct_members(target),
                _ => None,
            },
            _ => None,
        }
    }
}
