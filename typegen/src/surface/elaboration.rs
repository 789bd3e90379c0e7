//! Type checking: surface declarations to checked core declarations.
//!
//! Checking threads the global [`SymbolTable`] through each file of a
//! compilation in dependency order, so every file sees exactly the names its
//! includes declared. A declaration that fails to check is reported and
//! skipped; checking always continues with the rest of the file so one run
//! surfaces every problem.

use fxhash::FxHashMap;

use crate::core::{
    AliasDef, ArrayLen, ArrayType, Base, Definition, EnumDef, Item, Member, MemberType, Module,
    StructDef, SymbolTable, TrapArg, TrapDef, Type,
};
use crate::reporting::{ElabMessage, Message};
use crate::resolve::SourceFile;
use crate::source::ByteRange;
use crate::surface;
use crate::surface::{ArrayLength, Name, TypeExpr};

/// Check one resolved file against (and into) the global symbol table.
pub fn check_module(table: &mut SymbolTable, file: &SourceFile) -> (Module, Vec<Message>) {
    let mut context = Context {
        table,
        messages: Vec::new(),
    };

    let mut items = Vec::new();
    for item in &file.items {
        let checked = match item {
            surface::Item::TypeAlias(alias) => context.check_alias(alias),
            surface::Item::StructType(r#struct) => context.check_struct(r#struct),
            surface::Item::TrapSignature(trap) => context.check_trap(trap),
            surface::Item::EnumType(r#enum) => context.check_enum(r#enum),
            surface::Item::Include(_) => {
                unreachable!("include directives are consumed during resolution")
            }
        };
        items.extend(checked);
    }

    let module = Module {
        includes: file.includes.clone(),
        items,
    };

    (module, context.messages)
}

struct Context<'a> {
    table: &'a mut SymbolTable,
    messages: Vec<Message>,
}

impl<'a> Context<'a> {
    fn push(&mut self, message: ElabMessage) {
        self.messages.push(message.into());
    }

    /// Record a checked global definition, reporting a collision against the
    /// original definition site. The first definition always wins.
    fn define(&mut self, name: &Name, item: Item) -> Option<Item> {
        let definition = Definition {
            range: name.range,
            item: item.clone(),
        };
        match self.table.insert(name.text.clone(), definition) {
            Ok(()) => Some(item),
            Err(original_range) => {
                self.push(ElabMessage::DuplicateDefinition {
                    name: name.text.clone(),
                    original_range,
                    duplicate_range: name.range,
                });
                None
            }
        }
    }

    fn check_alias(&mut self, alias: &surface::TypeAlias) -> Option<Item> {
        match self.resolve_type_expr(&alias.name, None, &alias.r#type, &[]) {
            Some(r#type) => self.define(
                &alias.name,
                Item::Alias(AliasDef {
                    name: alias.name.text.clone(),
                    r#type,
                }),
            ),
            None => {
                self.table.poison(alias.name.text.clone());
                None
            }
        }
    }

    fn check_struct(&mut self, r#struct: &surface::StructType) -> Option<Item> {
        let mut local: FxHashMap<&str, ByteRange> = FxHashMap::default();
        let mut members: Vec<Member> = Vec::new();
        let mut offset = 0;
        let mut is_dynamic = false;

        for member in &r#struct.members {
            if let Some(original_range) = local.get(member.name.text.as_str()) {
                self.push(ElabMessage::DuplicateMember {
                    name: member.name.text.clone(),
                    original_range: *original_range,
                    duplicate_range: member.name.range,
                });
                continue;
            }
            local.insert(&member.name.text, member.name.range);

            let r#type = match self.resolve_type_expr(
                &member.name,
                Some(&r#struct.name),
                &member.r#type,
                &members,
            ) {
                Some(r#type) => r#type,
                None => continue,
            };

            let (size, dynamic) = match &r#type {
                MemberType::Scalar(r#type) => (r#type.size, r#type.is_dynamic),
                MemberType::Array(_) => (0, true),
            };
            is_dynamic |= dynamic;

            members.push(Member {
                name: member.name.text.clone(),
                r#type,
                offset,
            });
            offset += size;
        }

        self.define(
            &r#struct.name,
            Item::Struct(StructDef {
                name: r#struct.name.text.clone(),
                members,
                size: offset,
                is_dynamic,
            }),
        )
    }

    fn check_trap(&mut self, trap: &surface::TrapSignature) -> Option<Item> {
        let mut seen: FxHashMap<&str, ByteRange> = FxHashMap::default();
        let mut arguments = Vec::new();

        for argument in &trap.arguments {
            if let Some(original_range) = seen.get(argument.name.text.as_str()) {
                self.push(ElabMessage::DuplicateMember {
                    name: argument.name.text.clone(),
                    original_range: *original_range,
                    duplicate_range: argument.name.range,
                });
                continue;
            }
            seen.insert(&argument.name.text, argument.name.range);

            if let Some(r#type) =
                self.resolve_type_expr(&argument.name, None, &argument.r#type, &[])
            {
                arguments.push(TrapArg {
                    name: argument.name.text.clone(),
                    r#type,
                });
            }
        }

        let return_type = trap
            .return_type
            .as_ref()
            .and_then(|r#type| self.resolve_type_expr(&trap.name, None, r#type, &[]));

        self.define(
            &trap.name,
            Item::Trap(TrapDef {
                name: trap.name.text.clone(),
                arguments,
                return_type,
            }),
        )
    }

    fn check_enum(&mut self, r#enum: &surface::EnumType) -> Option<Item> {
        let mut seen: FxHashMap<&str, ByteRange> = FxHashMap::default();
        let mut values = Vec::new();

        for value in &r#enum.values {
            if let Some(original_range) = seen.get(value.name.text.as_str()) {
                self.push(ElabMessage::DuplicateEnumValue {
                    name: value.name.text.clone(),
                    original_range: *original_range,
                    duplicate_range: value.name.range,
                });
                continue;
            }
            seen.insert(&value.name.text, value.name.range);
            values.push((value.name.text.clone(), value.value));
        }

        self.define(
            &r#enum.name,
            Item::Enum(EnumDef {
                name: r#enum.name.text.clone(),
                values,
            }),
        )
    }

    /// Resolve a surface type expression against the builtins and the table.
    ///
    /// `siblings` holds the members already checked in the enclosing struct;
    /// counted array bounds must name one of them.
    fn resolve_type_expr(
        &mut self,
        owner: &Name,
        enclosing: Option<&Name>,
        r#type: &TypeExpr,
        siblings: &[Member],
    ) -> Option<MemberType> {
        match r#type {
            TypeExpr::Name { name, size, .. } => {
                let mut r#type = self.resolve_name(owner, enclosing, name)?;
                if let Some(size) = size {
                    // The parser only lets a size suffix through on `u8`.
                    r#type.size = *size;
                    r#type.user_size = Some(*size);
                }
                Some(MemberType::Scalar(r#type))
            }
            TypeExpr::Array {
                element, length, ..
            } => {
                if element.text == "str" {
                    self.push(ElabMessage::StringArrayElement {
                        range: element.range,
                    });
                    return None;
                }
                let element = (self.resolve_name(owner, enclosing, element)?, element);

                let length = match length {
                    ArrayLength::Counted { field, inclusive } => {
                        let bound = siblings
                            .iter()
                            .find(|member| member.name == field.text);
                        match bound {
                            None => {
                                self.push(ElabMessage::UnknownLengthField {
                                    range: field.range,
                                    name: field.text.clone(),
                                });
                                return None;
                            }
                            Some(member) => match &member.r#type {
                                MemberType::Scalar(r#type) if r#type.is_integer() => {}
                                _ => {
                                    self.push(ElabMessage::InvalidLengthField {
                                        range: field.range,
                                        name: field.text.clone(),
                                    });
                                    return None;
                                }
                            },
                        }
                        ArrayLen::Counted {
                            field: field.text.clone(),
                            inclusive: *inclusive,
                        }
                    }
                    ArrayLength::NullTerminated => {
                        // Nothing advances the cursor past a variable-width
                        // element when the sentinel read itself needs the
                        // element's size.
                        if element.0.is_dynamic {
                            self.push(ElabMessage::DynamicSentinelElement {
                                range: element.1.range,
                                name: element.1.text.clone(),
                            });
                            return None;
                        }
                        ArrayLen::NullTerminated
                    }
                };

                Some(MemberType::Array(ArrayType {
                    element: element.0,
                    length,
                }))
            }
        }
    }

    fn resolve_name(
        &mut self,
        owner: &Name,
        enclosing: Option<&Name>,
        name: &Name,
    ) -> Option<Type> {
        let references_self = owner.text == name.text
            || enclosing.map_or(false, |enclosing| enclosing.text == name.text);
        if references_self {
            self.push(ElabMessage::SelfReference {
                range: name.range,
                name: name.text.clone(),
            });
            return None;
        }

        if let Some(r#type) = Type::builtin(&name.text) {
            return Some(r#type);
        }
        if self.table.is_poisoned(&name.text) {
            return None;
        }

        let definition = match self.table.get(&name.text) {
            Some(definition) => definition,
            None => {
                self.push(ElabMessage::UnknownType {
                    range: name.range,
                    name: name.text.clone(),
                });
                return None;
            }
        };

        match &definition.item {
            Item::Alias(alias) => Some(match &alias.r#type {
                MemberType::Scalar(target) => Type {
                    name: name.text.clone(),
                    ..target.clone()
                },
                MemberType::Array(_) => Type {
                    name: name.text.clone(),
                    base: Base::Array,
                    size: 0,
                    is_dynamic: true,
                    user_size: None,
                },
            }),
            Item::Struct(r#struct) => Some(Type {
                name: name.text.clone(),
                base: Base::Struct(r#struct.name.clone()),
                size: r#struct.size,
                is_dynamic: r#struct.is_dynamic,
                user_size: None,
            }),
            Item::Enum(_) => Some(Type {
                name: name.text.clone(),
                base: Base::Enum,
                size: 4,
                is_dynamic: false,
                user_size: None,
            }),
            Item::Trap(_) => {
                // Trap names live in the same namespace but are not types.
                self.push(ElabMessage::UnknownType {
                    range: name.range,
                    name: name.text.clone(),
                });
                None
            }
        }
    }
}
