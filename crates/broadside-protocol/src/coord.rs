//! Shot coordinates: one row letter followed by a 1-based column number.
//!
//! `B5` is row 1, column 4. Letters are case-insensitive and surrounding
//! whitespace is ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// A zero-based cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parses player input for a `size`x`size` grid.
    ///
    /// # Errors
    /// See [`ParseError`] for the individual rejection reasons.
    ///
    /// # Examples
    ///
    /// ```
    /// use broadside_protocol::Coordinate;
    ///
    /// assert_eq!(Coordinate::parse("A1", 10).unwrap(), Coordinate::new(0, 0));
    /// assert_eq!(Coordinate::parse(" j10 ", 10).unwrap(), Coordinate::new(9, 9));
    /// assert!(Coordinate::parse("K1", 10).is_err());
    /// ```
    pub fn parse(input: &str, size: usize) -> Result<Self, ParseError> {
        let input = input.trim();
        let mut chars = input.chars();
        let letter = chars.next().ok_or(ParseError::Empty)?;

        if !letter.is_ascii_alphabetic() {
            return Err(ParseError::BadRow(letter));
        }
        let row = (letter.to_ascii_uppercase() as u8 - b'A') as usize;

        let digits = chars.as_str();
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::BadColumn(digits.to_string()));
        }
        let column: usize = digits
            .parse()
            .map_err(|_| ParseError::BadColumn(digits.to_string()))?;

        if row >= size || column == 0 || column > size {
            return Err(ParseError::OutOfBounds(input.to_ascii_uppercase(), size));
        }
        Ok(Self { row, col: column - 1 })
    }
}

/// Formats back into input form (`Coordinate::new(1, 4)` → `B5`).
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = (b'A' + self.row as u8) as char;
        write!(f, "{letter}{}", self.col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corners() {
        assert_eq!(Coordinate::parse("A1", 10), Ok(Coordinate::new(0, 0)));
        assert_eq!(Coordinate::parse("J10", 10), Ok(Coordinate::new(9, 9)));
        assert_eq!(Coordinate::parse("B5", 10), Ok(Coordinate::new(1, 4)));
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        assert_eq!(Coordinate::parse("  c7\t", 10), Ok(Coordinate::new(2, 6)));
    }

    #[test]
    fn test_parse_every_cell_roundtrips_through_display() {
        let mut seen = std::collections::HashSet::new();
        for row in 0..10 {
            for col in 0..10 {
                let cell = Coordinate::new(row, col);
                let text = cell.to_string();
                assert_eq!(Coordinate::parse(&text, 10), Ok(cell));
                assert!(seen.insert(text));
            }
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(Coordinate::parse("", 10), Err(ParseError::Empty));
        assert_eq!(Coordinate::parse("   ", 10), Err(ParseError::Empty));
    }

    #[test]
    fn test_parse_bad_row() {
        assert_eq!(Coordinate::parse("55", 10), Err(ParseError::BadRow('5')));
        assert_eq!(Coordinate::parse("?1", 10), Err(ParseError::BadRow('?')));
    }

    #[test]
    fn test_parse_bad_column() {
        for input in ["A", "AB", "A1x", "A100", "A-1", "A 1"] {
            assert!(
                matches!(Coordinate::parse(input, 10), Err(ParseError::BadColumn(_))),
                "{input:?} should have a bad column"
            );
        }
    }

    #[test]
    fn test_parse_out_of_bounds() {
        for input in ["K1", "A11", "A0", "Z10", "a00"] {
            assert!(
                matches!(Coordinate::parse(input, 10), Err(ParseError::OutOfBounds(_, 10))),
                "{input:?} should be out of bounds"
            );
        }
    }

    #[test]
    fn test_parse_respects_smaller_grid() {
        assert!(Coordinate::parse("E5", 5).is_ok());
        assert!(Coordinate::parse("F1", 5).is_err());
        assert!(Coordinate::parse("A6", 5).is_err());
    }
}
