//! Mapping from host key names and keypad labels to input tokens.

use crate::types::{Key, Operator};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("unknown key: {0:?}")]
    Unknown(String),
}

impl Key {
    /// Resolve a keyboard `key` value (`"Enter"`, `"Backspace"`, ...) or a
    /// keypad label (`"AC"`, `"÷"`, ...) to a token.
    pub fn from_name(name: &str) -> Result<Key, KeyError> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(key) = Key::from_char(c) {
                return Ok(key);
            }
        }

        match name.to_ascii_lowercase().as_str() {
            "enter" | "return" => Ok(Key::Equals),
            "backspace" | "delete" | "del" => Ok(Key::Delete),
            "escape" | "esc" | "ac" | "c" | "clear" => Ok(Key::Clear),
            _ => Err(KeyError::Unknown(name.to_string())),
        }
    }

    pub fn from_char(c: char) -> Option<Key> {
        if let Some(d) = c.to_digit(10) {
            return Some(Key::Digit(d as u8));
        }
        match c {
            '.' => Some(Key::DecimalPoint),
            '=' => Some(Key::Equals),
            other => Operator::from_symbol(other).map(Key::Operator),
        }
    }
}

/// Parse a key sequence such as `"12+3="` or `"1 2 + 3 Enter"`.
///
/// Whitespace separates tokens. A token that is a whole key name maps
/// directly; otherwise each character is mapped on its own.
pub fn parse_keys(input: &str) -> Result<Vec<Key>, KeyError> {
    let mut keys = Vec::new();
    for token in input.split_whitespace() {
        if let Ok(key) = Key::from_name(token) {
            keys.push(key);
            continue;
        }
        for c in token.chars() {
            let key = Key::from_char(c).ok_or_else(|| KeyError::Unknown(token.to_string()))?;
            keys.push(key);
        }
    }
    Ok(keys)
}
