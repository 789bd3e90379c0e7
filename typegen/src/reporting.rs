//! Diagnostic messages produced by the compiler stages.
//!
//! These can be converted to [`Diagnostic`]s in order to present them to the
//! user. Messages are accumulated per unit of work rather than short-circuiting
//! on the first failure; genuine invariant violations are panics, never
//! messages.
//!
//! [`Diagnostic`]: codespan_reporting::diagnostic::Diagnostic

use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::files::FileId;
use crate::source::ByteRange;

/// Global diagnostic messages.
#[derive(Debug, Clone)]
pub enum Message {
    /// A source file could not be read from disk.
    ReadFile { path: String, error: String },
    /// An `@include` chain came back around to a file that was still being
    /// resolved.
    CycleDetected { path: String, range: ByteRange },
    Lex(LexMessage),
    Parse(ParseMessage),
    Elab(ElabMessage),
    Codegen(CodegenMessage),
}

impl From<LexMessage> for Message {
    fn from(message: LexMessage) -> Message {
        Message::Lex(message)
    }
}

impl From<ParseMessage> for Message {
    fn from(message: ParseMessage) -> Message {
        Message::Parse(message)
    }
}

impl From<ElabMessage> for Message {
    fn from(message: ElabMessage) -> Message {
        Message::Elab(message)
    }
}

impl From<CodegenMessage> for Message {
    fn from(message: CodegenMessage) -> Message {
        Message::Codegen(message)
    }
}

impl Message {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Message::ReadFile { path, error } => Diagnostic::error()
                .with_message(format!("couldn't read `{path}`: {error}")),
            Message::CycleDetected { path, range } => Diagnostic::error()
                .with_message(format!("circular dependency detected at `{path}`"))
                .with_labels(vec![
                    Label::primary(range.file_id(), *range).with_message("included from here")
                ]),
            Message::Lex(message) => message.to_diagnostic(),
            Message::Parse(message) => message.to_diagnostic(),
            Message::Elab(message) => message.to_diagnostic(),
            Message::Codegen(message) => message.to_diagnostic(),
        }
    }
}

/// Lexical diagnostics. The tokenizer reports these and keeps scanning, so a
/// single pass surfaces every problem character in a file.
#[derive(Debug, Clone)]
pub enum LexMessage {
    UnknownCharacter { range: ByteRange },
    StraySlash { range: ByteRange },
}

impl LexMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            LexMessage::UnknownCharacter { range } => Diagnostic::error()
                .with_message("unknown character in file")
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
            LexMessage::StraySlash { range } => Diagnostic::error()
                .with_message("unknown character in file")
                .with_labels(vec![Label::primary(range.file_id(), *range)])
                .with_notes(vec!["help: should this be `//` for a comment?".to_owned()]),
        }
    }
}

/// Grammar violations. A malformed declaration aborts only that declaration;
/// the parser records the message and resynchronizes at the next one.
#[derive(Debug, Clone)]
pub enum ParseMessage {
    UnexpectedToken {
        range: ByteRange,
        expected: &'static str,
        found: String,
    },
    UnknownDeclarationStart {
        range: ByteRange,
    },
    UnknownMacro {
        range: ByteRange,
        name: String,
    },
    SizeSuffixNotAllowed {
        range: ByteRange,
        name: String,
    },
    BoundWithNullSentinel {
        range: ByteRange,
    },
    InvalidNumber {
        range: ByteRange,
    },
}

impl ParseMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            ParseMessage::UnexpectedToken {
                range,
                expected,
                found,
            } => Diagnostic::error()
                .with_message(format!("expected {expected}, found {found}"))
                .with_labels(vec![
                    Label::primary(range.file_id(), *range).with_message(format!("expected {expected}"))
                ]),
            ParseMessage::UnknownDeclarationStart { range } => Diagnostic::error()
                .with_message("unknown start of declaration")
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
            ParseMessage::UnknownMacro { range, name } => Diagnostic::error()
                .with_message(format!("unknown macro `@{name}`"))
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
            ParseMessage::SizeSuffixNotAllowed { range, name } => Diagnostic::error()
                .with_message(format!("`[<size>]` is only allowed on `u8`, not `{name}`"))
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
            ParseMessage::BoundWithNullSentinel { range } => Diagnostic::error()
                .with_message("a loop bound cannot be combined with `null`")
                .with_labels(vec![Label::primary(range.file_id(), *range)])
                .with_notes(vec![
                    "help: use `[<type> < <field>]` for a counted array, or `[<type> null]` for a null-terminated one".to_owned(),
                ]),
            ParseMessage::InvalidNumber { range } => Diagnostic::error()
                .with_message("number literal does not fit in 32 bits")
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
        }
    }
}

/// Type checking diagnostics.
#[derive(Debug, Clone)]
pub enum ElabMessage {
    UnknownType {
        range: ByteRange,
        name: String,
    },
    /// A name was defined twice at global scope.
    DuplicateDefinition {
        name: String,
        original_range: ByteRange,
        duplicate_range: ByteRange,
    },
    /// Two sibling members of one struct share a name.
    DuplicateMember {
        name: String,
        original_range: ByteRange,
        duplicate_range: ByteRange,
    },
    DuplicateEnumValue {
        name: String,
        original_range: ByteRange,
        duplicate_range: ByteRange,
    },
    SelfReference {
        range: ByteRange,
        name: String,
    },
    /// A counted array's bound does not name a preceding sibling member.
    UnknownLengthField {
        range: ByteRange,
        name: String,
    },
    /// A counted array's bound names a member that is not an integer scalar.
    InvalidLengthField {
        range: ByteRange,
        name: String,
    },
    /// Null-terminated arrays of dynamically sized structs are unsupported.
    DynamicSentinelElement {
        range: ByteRange,
        name: String,
    },
    /// `str` cannot be an array element type.
    StringArrayElement {
        range: ByteRange,
    },
}

impl ElabMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let primary = |range: &ByteRange| Label::primary(range.file_id(), *range);
        let secondary = |range: &ByteRange| Label::secondary(range.file_id(), *range);

        match self {
            ElabMessage::UnknownType { range, name } => Diagnostic::error()
                .with_message(format!("unknown type `{name}`"))
                .with_labels(vec![primary(range).with_message("not found in this scope")]),
            ElabMessage::DuplicateDefinition {
                name,
                original_range,
                duplicate_range,
            } => Diagnostic::error()
                .with_message(format!("type with name `{name}` already defined"))
                .with_labels(vec![
                    primary(duplicate_range).with_message("redefined here"),
                    secondary(original_range).with_message("originally defined here"),
                ]),
            ElabMessage::DuplicateMember {
                name,
                original_range,
                duplicate_range,
            } => Diagnostic::error()
                .with_message(format!("member with name `{name}` already defined"))
                .with_labels(vec![
                    primary(duplicate_range).with_message("redefined here"),
                    secondary(original_range).with_message("originally defined here"),
                ]),
            ElabMessage::DuplicateEnumValue {
                name,
                original_range,
                duplicate_range,
            } => Diagnostic::error()
                .with_message(format!("enum value with name `{name}` already defined"))
                .with_labels(vec![
                    primary(duplicate_range).with_message("redefined here"),
                    secondary(original_range).with_message("originally defined here"),
                ]),
            ElabMessage::SelfReference { range, name } => Diagnostic::error()
                .with_message(format!("type expression `{name}` references itself"))
                .with_labels(vec![primary(range)]),
            ElabMessage::UnknownLengthField { range, name } => Diagnostic::error()
                .with_message(format!(
                    "array bound `{name}` does not name a preceding member"
                ))
                .with_labels(vec![primary(range)]),
            ElabMessage::InvalidLengthField { range, name } => Diagnostic::error()
                .with_message(format!("array bound `{name}` must be an integer scalar"))
                .with_labels(vec![primary(range)]),
            ElabMessage::DynamicSentinelElement { range, name } => Diagnostic::error()
                .with_message(format!(
                    "null-terminated arrays of dynamically sized `{name}` are not supported"
                ))
                .with_labels(vec![primary(range)]),
            ElabMessage::StringArrayElement { range } => Diagnostic::error()
                .with_message("`str` cannot be used as an array element type")
                .with_labels(vec![primary(range)]),
        }
    }
}

/// Code generation diagnostics. These indicate a prior-stage gap (most
/// commonly a type whose size is only known through an array alias) and are
/// collected rather than raised so one run reports every unresolved size.
#[derive(Debug, Clone)]
pub enum CodegenMessage {
    UnresolvedSize { name: String },
}

impl CodegenMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            CodegenMessage::UnresolvedSize { name } => Diagnostic::error()
                .with_message(format!("no size found for type `{name}`")),
        }
    }
}
