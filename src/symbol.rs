//! Symbol alphabet
//!
//! The coder works over a fixed 28-symbol alphabet: the lowercase Latin
//! letters, space and newline. Text normalization happens before the core
//! ever sees a character; this module only validates and converts.

use crate::error::{Result, SymbolError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of symbols in the alphabet
pub const ALPHABET_SIZE: usize = 28;

/// One element of the alphabet
///
/// Stored as its index: 0-25 for `a`-`z`, 26 for space, 27 for newline.
/// Ordering follows the index, which keeps every map keyed by `Symbol`
/// iterating in the same order on encoder and decoder side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u8);

/// Space symbol
pub const SPACE: Symbol = Symbol(26);

/// Newline symbol
pub const NEWLINE: Symbol = Symbol(27);

impl Symbol {
    /// Convert a character into a symbol
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'a'..='z' => Ok(Symbol(c as u8 - b'a')),
            ' ' => Ok(SPACE),
            '\n' => Ok(NEWLINE),
            _ => Err(SymbolError::InvalidSymbol(c).into()),
        }
    }

    /// Build a symbol from its alphabet index
    pub fn from_index(index: u8) -> Result<Self> {
        if (index as usize) < ALPHABET_SIZE {
            Ok(Symbol(index))
        } else {
            Err(SymbolError::InvalidIndex(index).into())
        }
    }

    /// Alphabet index (0..28)
    pub fn index(self) -> u8 {
        self.0
    }

    /// Character this symbol stands for
    pub fn as_char(self) -> char {
        match self.0 {
            0..=25 => (b'a' + self.0) as char,
            26 => ' ',
            _ => '\n',
        }
    }

    /// Iterate over the whole alphabet in index order
    pub fn all() -> impl Iterator<Item = Symbol> {
        (0..ALPHABET_SIZE as u8).map(Symbol)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            ' ' => write!(f, "<space>"),
            '\n' => write!(f, "<newline>"),
            c => write!(f, "{}", c),
        }
    }
}

impl TryFrom<char> for Symbol {
    type Error = crate::error::PpmhError;

    fn try_from(c: char) -> Result<Self> {
        Symbol::from_char(c)
    }
}

impl From<Symbol> for char {
    fn from(symbol: Symbol) -> char {
        symbol.as_char()
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let c = char::deserialize(deserializer)?;
        Symbol::from_char(c).map_err(serde::de::Error::custom)
    }
}

/// Parse a normalized string into symbols
pub fn parse_symbols(text: &str) -> Result<Vec<Symbol>> {
    text.chars().map(Symbol::from_char).collect()
}

/// Render symbols back into text
pub fn symbols_to_string(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.as_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PpmhError;

    #[test]
    fn test_char_roundtrip() {
        for symbol in Symbol::all() {
            assert_eq!(Symbol::from_char(symbol.as_char()).unwrap(), symbol);
        }
        assert_eq!(Symbol::all().count(), ALPHABET_SIZE);
    }

    #[test]
    fn test_invalid_symbol() {
        let err = Symbol::from_char('A').unwrap_err();
        assert_eq!(err, PpmhError::Symbol(SymbolError::InvalidSymbol('A')));
        assert!(Symbol::from_char('é').is_err());
        assert!(Symbol::from_index(28).is_err());
    }

    #[test]
    fn test_parse_symbols() {
        let symbols = parse_symbols("ab c\n").unwrap();
        assert_eq!(symbols.len(), 5);
        assert_eq!(symbols[2], SPACE);
        assert_eq!(symbols[4], NEWLINE);
        assert_eq!(symbols_to_string(&symbols), "ab c\n");

        assert!(parse_symbols("abc!").is_err());
    }

    #[test]
    fn test_ordering_follows_index() {
        let a = Symbol::from_char('a').unwrap();
        let z = Symbol::from_char('z').unwrap();
        assert!(a < z);
        assert!(z < SPACE);
        assert!(SPACE < NEWLINE);
    }

    #[test]
    fn test_display() {
        assert_eq!(SPACE.to_string(), "<space>");
        assert_eq!(Symbol::from_char('q').unwrap().to_string(), "q");
    }
}
