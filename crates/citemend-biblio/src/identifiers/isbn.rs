use serde::{Deserialize, Serialize};

use crate::error::{BiblioError, Result};

/// Cleaned ISBN. Checksum is deliberately not verified here: registry lookup
/// is the validator, and citation text routinely carries transcription slips
/// that the catalog still resolves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Isbn {
    pub raw: String,
    pub normalized: String,
}

impl Isbn {
    pub fn parse(input: &str) -> Result<Self> {
        let normalized: String = input
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let digits_ok = normalized
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || (c == 'X' && i == normalized.len() - 1));
        if !digits_ok || !matches!(normalized.len(), 10 | 13) {
            return Err(BiblioError::InvalidIsbn(input.to_string()));
        }

        Ok(Self {
            raw: input.to_string(),
            normalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenated_isbn13() {
        let isbn = Isbn::parse("978-3-030-02083-5").unwrap();
        assert_eq!(isbn.normalized, "9783030020835");
    }

    #[test]
    fn spaced_isbn10() {
        let isbn = Isbn::parse("84 206 8304 5").unwrap();
        assert_eq!(isbn.normalized, "8420683045");
    }

    #[test]
    fn isbn10_with_x_check_char() {
        let isbn = Isbn::parse("0-8044-2957-x").unwrap();
        assert_eq!(isbn.normalized, "080442957X");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Isbn::parse("12345").is_err());
        assert!(Isbn::parse("").is_err());
    }

    #[test]
    fn rejects_x_in_the_middle() {
        assert!(Isbn::parse("08044X9575").is_err());
    }
}
