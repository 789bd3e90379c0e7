use logos::Logos;

use crate::files::FileId;
use crate::reporting::{LexMessage, Message};
use crate::source::{BytePos, ByteRange};

#[derive(Clone, Debug, PartialEq, Logos)]
pub enum Token<'source> {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Name(&'source str),
    #[regex(r"[0-9]+")]
    NumberLiteral(&'source str),
    #[regex(r#""[^"\n]*""#, |lex| {
        let slice = lex.slice();
        &slice[1..slice.len() - 1]
    })]
    StringLiteral(&'source str),

    #[token("type")]
    KeywordType,
    #[token("struct")]
    KeywordStruct,
    #[token("trap")]
    KeywordTrap,
    #[token("enum")]
    KeywordEnum,
    #[token("null")]
    KeywordNull,

    #[token("@")]
    At,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Equals,
    #[token("<")]
    Less,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[error]
    #[regex(r"\p{Whitespace}+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Error,
}

impl<'source> Token<'source> {
    pub fn description(&self) -> &'static str {
        match self {
            Token::Name(_) => "name",
            Token::NumberLiteral(_) => "number literal",
            Token::StringLiteral(_) => "string literal",
            Token::KeywordType => "type",
            Token::KeywordStruct => "struct",
            Token::KeywordTrap => "trap",
            Token::KeywordEnum => "enum",
            Token::KeywordNull => "null",
            Token::At => "@",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Equals => "=",
            Token::Less => "<",
            Token::OpenBrace => "{",
            Token::CloseBrace => "}",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Error => "error",
        }
    }
}

pub type Spanned<'source> = (Token<'source>, ByteRange);

/// Tokenize the full source text in one pass.
///
/// The tokenizer never fails the run: unrecognized characters are reported as
/// lexical diagnostics and scanning continues, so one file surfaces every
/// lexical problem at once.
pub fn tokens(file_id: FileId, source: &str) -> (Vec<Spanned<'_>>, Vec<Message>) {
    assert!(
        source.len() <= u32::MAX as usize,
        "`source` must be less than 4GiB in length"
    );

    let mut tokens = Vec::new();
    let mut messages = Vec::new();

    for (token, range) in Token::lexer(source).spanned() {
        let range = ByteRange::new(file_id, range.start as BytePos, range.end as BytePos);
        match token {
            Token::Error => {
                let slice: std::ops::Range<usize> = range.into();
                let message = if &source[slice] == "/" {
                    LexMessage::StraySlash { range }
                } else {
                    LexMessage::UnknownCharacter { range }
                };
                messages.push(message.into());
            }
            token => tokens.push((token, range)),
        }
    }

    (tokens, messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_id() -> FileId {
        FileId::try_from(1).unwrap()
    }

    fn kinds<'a>(source: &'a str) -> Vec<Token<'a>> {
        let (tokens, messages) = tokens(file_id(), source);
        assert!(messages.is_empty(), "unexpected messages: {messages:?}");
        tokens.into_iter().map(|(token, _)| token).collect()
    }

    #[test]
    fn keywords_and_names() {
        assert_eq!(
            kinds("type Rect struct nullable null"),
            vec![
                Token::KeywordType,
                Token::Name("Rect"),
                Token::KeywordStruct,
                Token::Name("nullable"),
                Token::KeywordNull,
            ],
        );
    }

    #[test]
    fn punctuation_and_literals() {
        assert_eq!(
            kinds(r#"x: u8[32]; @include("types") < ="#),
            vec![
                Token::Name("x"),
                Token::Colon,
                Token::Name("u8"),
                Token::OpenBracket,
                Token::NumberLiteral("32"),
                Token::CloseBracket,
                Token::Semicolon,
                Token::At,
                Token::Name("include"),
                Token::OpenParen,
                Token::StringLiteral("types"),
                Token::CloseParen,
                Token::Less,
                Token::Equals,
            ],
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// a comment\nfoo // another\n"),
            vec![Token::Name("foo")],
        );
    }

    #[test]
    fn unknown_character_keeps_scanning() {
        let (tokens, messages) = tokens(file_id(), "a ? b");
        assert_eq!(tokens.len(), 2);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            Message::Lex(LexMessage::UnknownCharacter { range })
                if range.start() == 2 && range.end() == 3
        ));
    }

    #[test]
    fn stray_slash_hints_at_comment() {
        let (_, messages) = tokens(file_id(), "/ not a comment");
        assert!(matches!(
            messages[0],
            Message::Lex(LexMessage::StraySlash { .. })
        ));
    }
}
