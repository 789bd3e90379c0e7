//! Surface language: the parsed form of a type definition file.
//!
//! Declarations are a closed set of tagged variants so that the checker and
//! the code generator match on them exhaustively; adding a variant is a
//! compile-time failure in every consumer, never a silent fallthrough.

use crate::source::ByteRange;

pub(crate) mod lexer;
pub mod parser;

pub mod elaboration;

/// An identifier together with the range it was written at.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub range: ByteRange,
    pub text: String,
}

/// Top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    TypeAlias(TypeAlias),
    StructType(StructType),
    TrapSignature(TrapSignature),
    EnumType(EnumType),
    Include(Include),
}

impl Item {
    pub fn range(&self) -> ByteRange {
        match self {
            Item::TypeAlias(item) => item.range,
            Item::StructType(item) => item.range,
            Item::TrapSignature(item) => item.range,
            Item::EnumType(item) => item.range,
            Item::Include(item) => item.range,
        }
    }
}

/// `type <name>: <type-expr>;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub range: ByteRange,
    pub name: Name,
    pub r#type: TypeExpr,
}

/// `struct <name> { <member>* }`
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub range: ByteRange,
    pub name: Name,
    pub members: Vec<Member>,
}

/// A named, typed binding: a struct member or a trap argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub range: ByteRange,
    pub name: Name,
    pub r#type: TypeExpr,
}

/// `trap <name>(<member>, ...) (: <type-expr>)? ;`
#[derive(Debug, Clone, PartialEq)]
pub struct TrapSignature {
    pub range: ByteRange,
    pub name: Name,
    pub arguments: Vec<Member>,
    pub return_type: Option<TypeExpr>,
}

/// `enum <name> { <value>: <number>; ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub range: ByteRange,
    pub name: Name,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub range: ByteRange,
    pub name: Name,
    pub value: u32,
}

/// `@include("relative/path")`
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub range: ByteRange,
    pub path: String,
}

/// Type expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A type name, optionally with a fixed byte-buffer size (`u8[32]`).
    Name {
        range: ByteRange,
        name: Name,
        size: Option<u32>,
    },
    /// An array of a scalar element type (`[u16 < count]`, `[Entry null]`).
    Array {
        range: ByteRange,
        element: Name,
        length: ArrayLength,
    },
}

impl TypeExpr {
    pub fn range(&self) -> ByteRange {
        match self {
            TypeExpr::Name { range, .. } => *range,
            TypeExpr::Array { range, .. } => *range,
        }
    }
}

/// The length discipline of an array type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayLength {
    /// Bounded by a named sibling field, exclusively (`<`) or inclusively
    /// (`<=`).
    Counted { field: Name, inclusive: bool },
    /// Decoded until a zero sentinel of the element's first scalar field.
    NullTerminated,
}
