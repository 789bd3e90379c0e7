//! Hand-written recursive descent parser for type definition files.
//!
//! A malformed declaration raises a structured [`ParseMessage`]; the
//! top-level loop records it and resynchronizes at the next token that can
//! start a declaration, so a file with several unrelated syntax errors
//! reports all of them in one run.

use crate::files::FileId;
use crate::reporting::{Message, ParseMessage};
use crate::source::{BytePos, ByteRange};
use crate::surface::lexer::{Spanned, Token};
use crate::surface::{
    ArrayLength, EnumType, EnumValue, Include, Item, Member, Name, StructType, TrapSignature,
    TypeAlias, TypeExpr,
};

type ParseResult<T> = Result<T, ParseMessage>;

/// Parse a token list into a declaration list plus accumulated diagnostics.
pub fn parse(file_id: FileId, source_len: usize, tokens: &[Spanned<'_>]) -> (Vec<Item>, Vec<Message>) {
    let end = source_len as BytePos;
    let mut parser = Parser {
        tokens,
        index: 0,
        eof_range: ByteRange::new(file_id, end, end),
    };

    let mut items = Vec::new();
    let mut messages = Vec::new();

    loop {
        let result = match parser.peek() {
            None => break,
            Some(Token::KeywordType) => parser.type_alias().map(Item::TypeAlias),
            Some(Token::KeywordStruct) => parser.struct_type().map(Item::StructType),
            Some(Token::KeywordTrap) => parser.trap_signature().map(Item::TrapSignature),
            Some(Token::KeywordEnum) => parser.enum_type().map(Item::EnumType),
            Some(Token::At) => parser.include().map(Item::Include),
            Some(_) => {
                let range = parser.current_range();
                parser.advance();
                messages.push(ParseMessage::UnknownDeclarationStart { range }.into());
                continue;
            }
        };

        match result {
            Ok(item) => items.push(item),
            Err(message) => {
                messages.push(message.into());
                parser.recover();
            }
        }
    }

    (items, messages)
}

struct Parser<'tokens, 'source> {
    tokens: &'tokens [Spanned<'source>],
    index: usize,
    eof_range: ByteRange,
}

impl<'tokens, 'source> Parser<'tokens, 'source> {
    fn peek(&self) -> Option<&Token<'source>> {
        self.tokens.get(self.index).map(|(token, _)| token)
    }

    fn current_range(&self) -> ByteRange {
        self.tokens
            .get(self.index)
            .map_or(self.eof_range, |(_, range)| *range)
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    /// Skip ahead to the next token that can start a declaration. Always
    /// consumes at least one token so recovery makes progress.
    fn recover(&mut self) {
        self.advance();
        while let Some(token) = self.peek() {
            match token {
                Token::KeywordType
                | Token::KeywordStruct
                | Token::KeywordTrap
                | Token::KeywordEnum
                | Token::At => break,
                _ => self.advance(),
            }
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseMessage {
        let found = match self.peek() {
            Some(token) => format!("`{}`", token.description()),
            None => "end of file".to_owned(),
        };
        ParseMessage::UnexpectedToken {
            range: self.current_range(),
            expected,
            found,
        }
    }

    fn expect(&mut self, token: Token<'static>, expected: &'static str) -> ParseResult<ByteRange> {
        match self.peek() {
            Some(current) if *current == token => {
                let range = self.current_range();
                self.advance();
                Ok(range)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn name(&mut self, expected: &'static str) -> ParseResult<Name> {
        match self.peek() {
            Some(Token::Name(text)) => {
                let name = Name {
                    range: self.current_range(),
                    text: (*text).to_owned(),
                };
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn number(&mut self, expected: &'static str) -> ParseResult<(u32, ByteRange)> {
        match self.peek() {
            Some(Token::NumberLiteral(text)) => {
                let range = self.current_range();
                let value = text
                    .parse::<u32>()
                    .map_err(|_| ParseMessage::InvalidNumber { range })?;
                self.advance();
                Ok((value, range))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// `type <name>: <type-expr>;`
    fn type_alias(&mut self) -> ParseResult<TypeAlias> {
        let start = self.current_range();
        self.advance();

        let Member { name, r#type, .. } = self.assign()?;
        let end = self.expect(Token::Semicolon, "`;`")?;

        Ok(TypeAlias {
            range: start.merge(&end),
            name,
            r#type,
        })
    }

    /// `<name>: <type-expr>`
    fn assign(&mut self) -> ParseResult<Member> {
        let name = self.name("a label")?;
        self.expect(Token::Colon, "`:`")?;
        let r#type = self.type_expr()?;

        Ok(Member {
            range: name.range.merge(&r#type.range()),
            name,
            r#type,
        })
    }

    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        if let Some(Token::OpenBracket) = self.peek() {
            return self.array_type();
        }

        let name = self.name("a type")?;
        let mut range = name.range;
        let mut size = None;

        if let Some(Token::OpenBracket) = self.peek() {
            if name.text != "u8" {
                return Err(ParseMessage::SizeSuffixNotAllowed {
                    range: self.current_range(),
                    name: name.text,
                });
            }
            self.advance();
            let (value, _) = self.number("a size")?;
            let end = self.expect(Token::CloseBracket, "`]`")?;
            range = range.merge(&end);
            size = Some(value);
        }

        Ok(TypeExpr::Name { range, name, size })
    }

    /// `[<element> < <field>]`, `[<element> <= <field>]` or `[<element> null]`
    fn array_type(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current_range();
        self.advance();

        let element = self.name("an element type")?;

        let length = match self.peek() {
            Some(Token::KeywordNull) => {
                self.advance();
                ArrayLength::NullTerminated
            }
            Some(Token::Less) => {
                self.advance();
                let inclusive = match self.peek() {
                    Some(Token::Equals) => {
                        self.advance();
                        true
                    }
                    _ => false,
                };
                match self.peek() {
                    Some(Token::KeywordNull) => {
                        return Err(ParseMessage::BoundWithNullSentinel {
                            range: start.merge(&self.current_range()),
                        });
                    }
                    _ => {}
                }
                let field = self.name("a length field")?;
                ArrayLength::Counted { field, inclusive }
            }
            _ => return Err(self.unexpected("`<` or `null`")),
        };

        let end = self.expect(Token::CloseBracket, "`]`")?;

        Ok(TypeExpr::Array {
            range: start.merge(&end),
            element,
            length,
        })
    }

    /// `struct <name> { (<assign>;)* }`
    fn struct_type(&mut self) -> ParseResult<StructType> {
        let start = self.current_range();
        self.advance();

        let name = self.name("a struct name")?;
        self.expect(Token::OpenBrace, "`{`")?;

        let mut members = Vec::new();
        loop {
            match self.peek() {
                Some(Token::CloseBrace) => break,
                Some(_) => {
                    let member = self.assign()?;
                    self.expect(Token::Semicolon, "`;`")?;
                    members.push(member);
                }
                None => return Err(self.unexpected("`}`")),
            }
        }
        let end = self.expect(Token::CloseBrace, "`}`")?;

        Ok(StructType {
            range: start.merge(&end),
            name,
            members,
        })
    }

    /// `trap <name>((<assign>),*) (: <type-expr>)? ;`
    fn trap_signature(&mut self) -> ParseResult<TrapSignature> {
        let start = self.current_range();
        self.advance();

        let name = self.name("a trap name")?;
        self.expect(Token::OpenParen, "`(`")?;

        let mut arguments = Vec::new();
        loop {
            match self.peek() {
                Some(Token::CloseParen) => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    arguments.push(self.assign()?);
                    match self.peek() {
                        Some(Token::Comma) => self.advance(),
                        Some(Token::CloseParen) => {}
                        _ => return Err(self.unexpected("`,` or `)`")),
                    }
                }
                None => return Err(self.unexpected("`)`")),
            }
        }

        let return_type = match self.peek() {
            Some(Token::Colon) => {
                self.advance();
                Some(self.type_expr()?)
            }
            _ => None,
        };
        let end = self.expect(Token::Semicolon, "`;`")?;

        Ok(TrapSignature {
            range: start.merge(&end),
            name,
            arguments,
            return_type,
        })
    }

    /// `enum <name> { (<name>: <number>;)* }`
    fn enum_type(&mut self) -> ParseResult<EnumType> {
        let start = self.current_range();
        self.advance();

        let name = self.name("an enum name")?;
        self.expect(Token::OpenBrace, "`{`")?;

        let mut values = Vec::new();
        loop {
            match self.peek() {
                Some(Token::CloseBrace) => break,
                Some(_) => {
                    let value_name = self.name("a value name")?;
                    self.expect(Token::Colon, "`:`")?;
                    let (value, _) = self.number("a value")?;
                    let end = self.expect(Token::Semicolon, "`;`")?;
                    values.push(EnumValue {
                        range: value_name.range.merge(&end),
                        name: value_name,
                        value,
                    });
                }
                None => return Err(self.unexpected("`}`")),
            }
        }
        let end = self.expect(Token::CloseBrace, "`}`")?;

        Ok(EnumType {
            range: start.merge(&end),
            name,
            values,
        })
    }

    /// `@include("relative/path")`
    fn include(&mut self) -> ParseResult<Include> {
        let start = self.current_range();
        self.advance();

        let macro_name = self.name("a macro name")?;
        if macro_name.text != "include" {
            return Err(ParseMessage::UnknownMacro {
                range: macro_name.range,
                name: macro_name.text,
            });
        }

        self.expect(Token::OpenParen, "`(`")?;
        let path = match self.peek() {
            Some(Token::StringLiteral(path)) => {
                let path = (*path).to_owned();
                self.advance();
                path
            }
            _ => return Err(self.unexpected("a string path to include")),
        };
        let end = self.expect(Token::CloseParen, "`)`")?;

        Ok(Include {
            range: start.merge(&end),
            path,
        })
    }
}
