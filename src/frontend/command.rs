//! Line-oriented command language of the CLI.
//!
//! ```text
//! create <table> <col>:<type> [not null] ...
//! drop <table>
//! insert <table> <literal> ...
//! select <table>
//! update <table> set <col> = <literal> [where <col> <op> <literal>]
//! tables | help | exit
//! ```

use std::fmt;

use crate::{
    execution::operators::filter::{CompOp, FieldPredicate},
    types::{
        datatype::DataType,
        schema::{Column, Schema},
        value::Value,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create { table: String, schema: Schema },
    Drop { table: String },
    Insert { table: String, values: Vec<Value> },
    Select { table: String },
    Update {
        table: String,
        field: String,
        value: Value,
        predicate: Option<FieldPredicate>,
    },
    Tables,
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    UnexpectedEnd { expected: &'static str },
    UnexpectedToken { expected: &'static str, found: String },
    UnterminatedString,
    InvalidLiteral(String),
    InvalidColumn(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::UnknownCommand(c) => write!(f, "unknown command '{}'", c),
            ParseError::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of input, expected {}", expected)
            }
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found '{}'", expected, found)
            }
            ParseError::UnterminatedString => write!(f, "unterminated string literal"),
            ParseError::InvalidLiteral(s) => write!(f, "invalid literal '{}'", s),
            ParseError::InvalidColumn(s) => {
                write!(f, "invalid column '{}', expected <name>:<type>", s)
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Op(String),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Word(w) | Token::Op(w) => w.clone(),
            Token::Str(s) => format!("'{}'", s),
        }
    }
}

fn is_op_char(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '!')
}

fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    // '' inside a literal is an escaped quote
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        s.push('\'');
                    }
                    Some('\'') => break,
                    Some(ch) => s.push(ch),
                    None => return Err(ParseError::UnterminatedString),
                }
            }
            tokens.push(Token::Str(s));
        } else if is_op_char(c) {
            let mut op = String::new();
            while let Some(&ch) = chars.peek() {
                if !is_op_char(ch) {
                    break;
                }
                op.push(ch);
                chars.next();
            }
            tokens.push(Token::Op(op));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '\'' || is_op_char(ch) {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self, expected: &'static str) -> Result<Token, ParseError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(tok)
    }

    fn ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.bump(expected)? {
            Token::Word(w) => Ok(w),
            other => Err(ParseError::UnexpectedToken {
                expected,
                found: other.text(),
            }),
        }
    }

    fn keyword(&mut self, kw: &'static str) -> Result<(), ParseError> {
        match self.bump(kw)? {
            Token::Word(w) if w.eq_ignore_ascii_case(kw) => Ok(()),
            other => Err(ParseError::UnexpectedToken {
                expected: kw,
                found: other.text(),
            }),
        }
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(kw))
    }

    fn op(&mut self) -> Result<CompOp, ParseError> {
        const EXPECTED: &str = "comparison operator";
        match self.bump(EXPECTED)? {
            Token::Op(op) => CompOp::parse(&op).ok_or(ParseError::UnexpectedToken {
                expected: EXPECTED,
                found: op,
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: EXPECTED,
                found: other.text(),
            }),
        }
    }

    fn literal(&mut self) -> Result<Value, ParseError> {
        match self.bump("literal")? {
            Token::Str(s) => Ok(Value::String(s)),
            Token::Word(w) => parse_literal(&w),
            Token::Op(op) => Err(ParseError::InvalidLiteral(op)),
        }
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(ParseError::UnexpectedToken {
                expected: "end of command",
                found: tok.text(),
            }),
        }
    }

    fn column(&mut self) -> Result<Column, ParseError> {
        let def = self.ident("column definition")?;
        let (name, ty) = def
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidColumn(def.clone()))?;
        let ty = DataType::parse(ty).ok_or_else(|| ParseError::InvalidColumn(def.clone()))?;
        if name.is_empty() {
            return Err(ParseError::InvalidColumn(def));
        }

        let column = Column::new(name, ty);
        if self.peek_keyword("not") {
            self.keyword("not")?;
            self.keyword("null")?;
            return Ok(column.not_null());
        }
        Ok(column)
    }
}

fn parse_literal(word: &str) -> Result<Value, ParseError> {
    if word.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    if word.eq_ignore_ascii_case("true") {
        return Ok(Value::Boolean(true));
    }
    if word.eq_ignore_ascii_case("false") {
        return Ok(Value::Boolean(false));
    }
    if let Ok(i) = word.parse::<i64>() {
        return Ok(Value::Int64(i));
    }
    if word.contains('.') {
        if let Ok(f) = word.parse::<f64>() {
            return Ok(Value::Float64(f));
        }
    }
    Err(ParseError::InvalidLiteral(word.to_string()))
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(line.trim().trim_end_matches(';'))?;
    let mut p = Parser { tokens, pos: 0 };

    let head = match p.peek() {
        None => return Err(ParseError::Empty),
        Some(_) => p.ident("command")?.to_ascii_lowercase(),
    };

    let cmd = match head.as_str() {
        "create" => {
            let table = p.ident("table name")?;
            let mut columns = vec![p.column()?];
            while p.peek().is_some() {
                columns.push(p.column()?);
            }
            Command::Create {
                table,
                schema: Schema::new(columns),
            }
        }
        "drop" => Command::Drop {
            table: p.ident("table name")?,
        },
        "insert" => {
            let table = p.ident("table name")?;
            let mut values = Vec::new();
            while p.peek().is_some() {
                values.push(p.literal()?);
            }
            Command::Insert { table, values }
        }
        "select" => Command::Select {
            table: p.ident("table name")?,
        },
        "update" => {
            let table = p.ident("table name")?;
            p.keyword("set")?;
            let field = p.ident("column name")?;
            match p.op()? {
                CompOp::Eq => {}
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "'='",
                        found: other.to_string(),
                    });
                }
            }
            let value = p.literal()?;

            let predicate = if p.peek().is_some() {
                p.keyword("where")?;
                let field = p.ident("column name")?;
                let op = p.op()?;
                let value = p.literal()?;
                Some(FieldPredicate { field, op, value })
            } else {
                None
            };

            Command::Update {
                table,
                field,
                value,
                predicate,
            }
        }
        "tables" => Command::Tables,
        "help" => Command::Help,
        "exit" | "quit" => Command::Exit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    p.finish()?;
    Ok(cmd)
}
