//! Tag blob parser.
//!
//! Source rows embed their OSM tags as one serialized map.  Two spellings
//! occur in practice:
//!
//! ```text
//! {"addr_street": "Hlavni", "levels": 3}          JSON object
//! {'addr_street': 'Hlavni', 'levels': 3, 'x': None} Python dict literal
//! ```
//!
//! JSON is tried first.  The Python-literal grammar understood here:
//!
//! ```text
//! Value  ::= Dict | List | Tuple | String | Number | 'True' | 'False' | 'None'
//! Dict   ::= '{' ( Key ':' Value ( ',' Key ':' Value )* ','? )? '}'
//! List   ::= '[' ( Value ( ',' Value )* ','? )? ']'
//! Tuple  ::= '(' ( Value ( ',' Value )* ','? )? ')'
//! Key    ::= String | Number | 'True' | 'False' | 'None'
//! String ::= "'" ... "'" | '"' ... '"'     (backslash escapes)
//! ```
//!
//! Keys that are not strings become their text form, since a tag map is keyed
//! by string.  Anything other than a top-level map is rejected.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use sg_core::Tags;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid tag blob at offset {offset}: {message}")]
pub struct TagBlobError {
    pub offset:  usize,
    pub message: String,
}

/// Parse a JSON or Python-literal dict into a tag map.
pub fn parse_tag_blob(input: &str) -> Result<Tags, TagBlobError> {
    let value = match serde_json::from_str::<Value>(input) {
        Ok(v) => v,
        Err(_) => {
            let mut p = LiteralParser { chars: input.chars().collect(), pos: 0 };
            let v = p.value()?;
            p.skip_ws();
            if p.pos < p.chars.len() {
                return Err(p.error("trailing characters"));
            }
            v
        }
    };
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(TagBlobError {
            offset:  0,
            message: format!("expected a map, got {}", kind(&other)),
        }),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

// ── Python literal parser ─────────────────────────────────────────────────────

struct LiteralParser {
    chars: Vec<char>,
    pos:   usize,
}

impl LiteralParser {
    fn error(&self, message: impl Into<String>) -> TagBlobError {
        TagBlobError { offset: self.pos, message: message.into() }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char) -> Result<(), TagBlobError> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => {
                self.pos -= 1;
                Err(self.error(format!("expected '{want}', found '{c}'")))
            }
            None => Err(self.error(format!("expected '{want}', found end of input"))),
        }
    }

    fn value(&mut self) -> Result<Value, TagBlobError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.dict(),
            Some('[') => self.sequence('[', ']'),
            Some('(') => self.sequence('(', ')'),
            Some('\'' | '"') => self.string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn dict(&mut self) -> Result<Value, TagBlobError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Object(_) | Value::Array(_) => return Err(self.error("unhashable key")),
                other => other.to_string(),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Value::Object(map)),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected ',' or '}'"));
                }
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, TagBlobError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => return Ok(Value::Array(items)),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error(format!("expected ',' or '{close}'")));
                }
            }
        }
    }

    fn string(&mut self) -> Result<String, TagBlobError> {
        let quote = self.bump().ok_or_else(|| self.error("expected a string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let esc = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' => out.push(esc),
                        'x' => out.push(self.hex_escape(2)?),
                        'u' => out.push(self.hex_escape(4)?),
                        'U' => out.push(self.hex_escape(8)?),
                        '\n' => {}
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, TagBlobError> {
        let end = self.pos + digits;
        let hex: String = self.chars.get(self.pos..end).unwrap_or_default().iter().collect();
        let code = u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|_| hex.len() == digits)
            .ok_or_else(|| self.error("bad hex escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid character"))
    }

    fn number(&mut self) -> Result<Value, TagBlobError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().filter(|&&c| c != '_').collect();
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| TagBlobError { offset: start, message: format!("bad number '{text}'") })
    }

    fn keyword(&mut self) -> Result<Value, TagBlobError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ => Err(TagBlobError { offset: start, message: format!("unknown name '{word}'") }),
        }
    }
}
