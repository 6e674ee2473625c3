/*
    decode.rs - Strict canonical decoder

    Accepts a byte string only if it is the unique canonical encoding of the
    value it decodes to. Rejects:
    - truncated input and trailing bytes
    - leading zeros in integers and lengths, negative zero
    - dictionary keys out of order, duplicated, or not UTF-8
    - nesting deeper than the configured limit
*/

use super::value::{Dict, Value};
use crate::errors::DecodeError;

/// Resource limits applied while decoding untrusted bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum nesting of lists and dictionaries
    pub max_depth: usize,

    /// Maximum accepted input size in bytes
    pub max_input_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_depth: 32,
            max_input_len: 4 * 1024 * 1024, // 4 MiB
        }
    }
}

/// Decode with default limits
pub fn decode(input: &[u8]) -> Result<Value, DecodeError> {
    decode_with_limits(input, &DecodeLimits::default())
}

/// Decode `input`, which must contain exactly one canonical value
pub fn decode_with_limits(input: &[u8], limits: &DecodeLimits) -> Result<Value, DecodeError> {
    if input.len() > limits.max_input_len {
        return Err(DecodeError::TooLarge {
            actual: input.len(),
            max: limits.max_input_len,
        });
    }

    let mut decoder = Decoder {
        input,
        pos: 0,
        limits,
    };
    let value = decoder.value(0)?;

    if decoder.pos != input.len() {
        return Err(DecodeError::TrailingBytes(input.len() - decoder.pos));
    }
    Ok(value)
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    limits: &'a DecodeLimits,
}

impl<'a> Decoder<'a> {
    fn peek(&self) -> Result<u8, DecodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::Truncated(self.pos))
    }

    fn value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        match self.peek()? {
            b'n' => {
                self.pos += 1;
                Ok(Value::Null)
            }
            b't' => {
                self.pos += 1;
                Ok(Value::Bool(true))
            }
            b'f' => {
                self.pos += 1;
                Ok(Value::Bool(false))
            }
            b'i' => self.int().map(Value::Int),
            b'0'..=b'9' => self.bytes().map(Value::Bytes),
            b'l' => self.list(depth),
            b'd' => self.dict(depth),
            byte => Err(DecodeError::UnexpectedByte {
                byte,
                offset: self.pos,
            }),
        }
    }

    fn enter(&self, depth: usize) -> Result<(), DecodeError> {
        if depth >= self.limits.max_depth {
            return Err(DecodeError::TooDeep(self.limits.max_depth));
        }
        Ok(())
    }

    fn list(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.enter(depth)?;
        self.pos += 1;

        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.value(depth + 1)?);
        }
        self.pos += 1;
        Ok(Value::List(items))
    }

    fn dict(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.enter(depth)?;
        self.pos += 1;

        let mut dict = Dict::new();
        let mut last_key: Option<String> = None;
        loop {
            let byte = self.peek()?;
            if byte == b'e' {
                break;
            }
            let key_offset = self.pos;
            if !byte.is_ascii_digit() {
                return Err(DecodeError::UnexpectedByte {
                    byte,
                    offset: key_offset,
                });
            }

            let raw = self.bytes()?;
            let key = String::from_utf8(raw).map_err(|_| DecodeError::InvalidKey(key_offset))?;
            if let Some(prev) = &last_key {
                if key.as_bytes() <= prev.as_bytes() {
                    return Err(DecodeError::NonCanonical {
                        offset: key_offset,
                        reason: "dictionary keys must be strictly ascending",
                    });
                }
            }

            let value = self.value(depth + 1)?;
            dict.insert(key.clone(), value);
            last_key = Some(key);
        }
        self.pos += 1;
        Ok(Value::Dict(dict))
    }

    fn int(&mut self) -> Result<i64, DecodeError> {
        let start = self.pos;
        self.pos += 1;
        let end = self.find(b'e')?;
        let n = parse_number(&self.input[self.pos..end], start, true)?;
        self.pos = end + 1;
        Ok(n)
    }

    fn bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let start = self.pos;
        let colon = self.find(b':')?;
        let len = parse_number(&self.input[self.pos..colon], start, false)?;
        let len = usize::try_from(len).map_err(|_| DecodeError::MalformedNumber(start))?;

        let body_start = colon + 1;
        if self.input.len() - body_start < len {
            return Err(DecodeError::Truncated(self.input.len()));
        }
        self.pos = body_start + len;
        Ok(self.input[body_start..self.pos].to_vec())
    }

    fn find(&self, terminator: u8) -> Result<usize, DecodeError> {
        self.input[self.pos..]
            .iter()
            .position(|&b| b == terminator)
            .map(|i| self.pos + i)
            .ok_or(DecodeError::Truncated(self.input.len()))
    }
}

fn parse_number(digits: &[u8], offset: usize, signed: bool) -> Result<i64, DecodeError> {
    let (negative, body) = match digits.split_first() {
        Some((b'-', rest)) if signed => (true, rest),
        _ => (false, digits),
    };

    if body.is_empty() || !body.iter().all(u8::is_ascii_digit) {
        return Err(DecodeError::MalformedNumber(offset));
    }
    if body.len() > 1 && body[0] == b'0' {
        return Err(DecodeError::NonCanonical {
            offset,
            reason: "leading zero",
        });
    }
    if negative && body == b"0" {
        return Err(DecodeError::NonCanonical {
            offset,
            reason: "negative zero",
        });
    }

    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(DecodeError::MalformedNumber(offset))
}
