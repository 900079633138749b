//! Expression pass: `?#{...}` evaluation and `:name` rewriting.
//!
//! ```text
//! expr    := operand ('+' operand)*
//! operand := '[' index ']' path* | '#' ident path* | '\'' text '\'' | integer
//! path    := '.' ident
//! ```

use super::{BindableStatement, QUERY_ARGS_SEPARATOR};
use crate::domain::parameters::{ParamValue, ParameterAccessor};
use crate::errors::EvaluationError;
use serde_json::Value;

const EXPRESSION_OPEN: &[u8] = b"?#{";

/// Evaluates embedded expressions and rewrites named placeholders.
///
/// Each expression result is appended to the positional values and replaced
/// by its new ordinal. A `:name` naming a declared parameter becomes that
/// parameter's ordinal; any other `:` text is kept.
pub fn bind_statement(
    template: &str,
    params: &ParameterAccessor<'_>,
) -> Result<BindableStatement, EvaluationError> {
    let bytes = template.as_bytes();
    let mut values: Vec<ParamValue> = params.values().to_vec();
    let mut out = String::with_capacity(template.len());
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(EXPRESSION_OPEN) {
            out.push_str(&template[literal_start..i]);
            let body_start = i + EXPRESSION_OPEN.len();
            let close = find_close(bytes, body_start)
                .ok_or(EvaluationError::Unterminated { position: i })?;

            let value = evaluate(&template[body_start..close], params)?;
            values.push(value);
            out.push('?');
            out.push_str(&(values.len() - 1).to_string());

            i = close + 1;
            literal_start = i;
        } else if bytes[i] == b':'
            && (i == 0 || !is_ident_byte(bytes[i - 1]) || template[..i].ends_with(QUERY_ARGS_SEPARATOR))
            && bytes.get(i + 1).copied().is_some_and(is_ident_start)
        {
            let end = name_end(template, i + 1);
            if let Some(index) = params.index_of(&template[i + 1..end]) {
                out.push_str(&template[literal_start..i]);
                out.push('?');
                out.push_str(&index.to_string());
                literal_start = end;
            }
            i = end;
        } else {
            i += 1;
        }
    }

    out.push_str(&template[literal_start..]);
    Ok(BindableStatement::new(out, values))
}

/// Evaluates a single expression body against the call parameters.
pub fn evaluate(source: &str, params: &ParameterAccessor<'_>) -> Result<ParamValue, EvaluationError> {
    let operands = Parser::new(source).parse()?;

    let mut values = operands
        .iter()
        .map(|operand| operand.evaluate(params))
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() == 1 {
        return Ok(values.remove(0));
    }
    Ok(ParamValue::Text(
        values.iter().map(ParamValue::to_arg_string).collect(),
    ))
}

fn find_close(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quoted = false;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match b {
            b'\'' => quoted = !quoted,
            b'}' if !quoted => return Some(from + offset),
            _ => {}
        }
    }
    None
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// End of a `:name` starting at `start`. The name stops where the argument
/// separator begins.
fn name_end(template: &str, start: usize) -> usize {
    let end = start + ident_len(&template.as_bytes()[start..]);
    if end - start > 1 && template[end - 1..].starts_with(QUERY_ARGS_SEPARATOR) {
        end - 1
    } else {
        end
    }
}

fn ident_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(&b) if is_ident_start(b) => bytes.iter().take_while(|&&b| is_ident_byte(b)).count(),
        _ => 0,
    }
}

// =============================================================================
// OPERANDS
// =============================================================================

#[derive(Debug, PartialEq)]
enum Operand {
    Index(usize, Vec<String>),
    Named(String, Vec<String>),
    Literal(String),
    Integer(i64),
}

impl Operand {
    fn evaluate(&self, params: &ParameterAccessor<'_>) -> Result<ParamValue, EvaluationError> {
        match self {
            Self::Index(index, path) => {
                let root = params.get(*index).ok_or(EvaluationError::IndexOutOfBounds {
                    index: *index,
                    len: params.len(),
                })?;
                navigate(root, path, &format!("[{index}]"))
            }
            Self::Named(name, path) => {
                let root = params
                    .by_name(name)
                    .ok_or_else(|| EvaluationError::UnknownParameter(name.clone()))?;
                navigate(root, path, &format!("#{name}"))
            }
            Self::Literal(text) => Ok(ParamValue::Text(text.clone())),
            Self::Integer(n) => Ok(ParamValue::Int(*n)),
        }
    }
}

fn navigate(root: &ParamValue, path: &[String], label: &str) -> Result<ParamValue, EvaluationError> {
    if path.is_empty() {
        return Ok(root.clone());
    }

    let mut current = root.to_json().map_err(|e| EvaluationError::NoSuchProperty {
        property: path[0].clone(),
        target: format!("{label} ({e})"),
    })?;
    let mut walked = label.to_string();

    for property in path {
        current = match current {
            Value::Null => return Err(EvaluationError::NullNavigation(property.clone())),
            Value::Object(mut map) => {
                map.remove(property)
                    .ok_or_else(|| EvaluationError::NoSuchProperty {
                        property: property.clone(),
                        target: walked.clone(),
                    })?
            }
            _ => {
                return Err(EvaluationError::NoSuchProperty {
                    property: property.clone(),
                    target: walked,
                })
            }
        };
        walked.push('.');
        walked.push_str(property);
    }

    Ok(from_json(current))
}

fn from_json(value: Value) -> ParamValue {
    match value {
        Value::Null => ParamValue::Null,
        Value::Bool(b) => ParamValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ParamValue::Int(i),
            None => n.as_f64().map_or_else(|| ParamValue::Text(n.to_string()), ParamValue::Float),
        },
        Value::String(s) => ParamValue::Text(s),
        other => ParamValue::Text(other.to_string()),
    }
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn parse(mut self) -> Result<Vec<Operand>, EvaluationError> {
        self.skip_ws();
        if self.at_end() {
            return Err(self.error("empty expression"));
        }

        let mut operands = vec![self.operand()?];
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(b'+') => {
                    self.pos += 1;
                    self.skip_ws();
                    operands.push(self.operand()?);
                }
                Some(_) => return Err(self.error("expected '+'")),
            }
        }
        Ok(operands)
    }

    fn operand(&mut self) -> Result<Operand, EvaluationError> {
        match self.peek() {
            Some(b'[') => {
                self.pos += 1;
                self.skip_ws();
                let digits = self.take_while(|b| b.is_ascii_digit());
                if digits.is_empty() {
                    return Err(self.error("expected parameter index"));
                }
                let index = digits
                    .parse()
                    .map_err(|_| self.error("parameter index too large"))?;
                self.skip_ws();
                self.expect(b']')?;
                Ok(Operand::Index(index, self.path()?))
            }
            Some(b'#') => {
                self.pos += 1;
                let name = self.ident()?;
                Ok(Operand::Named(name, self.path()?))
            }
            Some(b'\'') => {
                self.pos += 1;
                let text = self.take_while(|b| b != b'\'').to_string();
                self.expect(b'\'')?;
                Ok(Operand::Literal(text))
            }
            Some(b) if b == b'-' || b.is_ascii_digit() => {
                let start = self.pos;
                self.pos += 1;
                self.take_while(|b| b.is_ascii_digit());
                let raw = &self.src[start..self.pos];
                raw.parse()
                    .map(Operand::Integer)
                    .map_err(|_| self.error("invalid integer"))
            }
            _ => Err(self.error("expected operand")),
        }
    }

    fn path(&mut self) -> Result<Vec<String>, EvaluationError> {
        let mut path = Vec::new();
        while self.peek() == Some(b'.') {
            self.pos += 1;
            path.push(self.ident()?);
        }
        Ok(path)
    }

    fn ident(&mut self) -> Result<String, EvaluationError> {
        let len = ident_len(&self.src.as_bytes()[self.pos..]);
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        let ident = self.src[self.pos..self.pos + len].to_string();
        self.pos += len;
        Ok(ident)
    }

    fn expect(&mut self, b: u8) -> Result<(), EvaluationError> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", b as char)))
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'s str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, reason: &str) -> EvaluationError {
        EvaluationError::Syntax {
            expression: self.src.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }
}
