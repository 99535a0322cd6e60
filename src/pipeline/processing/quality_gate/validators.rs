use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::US_STATE_CODES;

static TWO_LETTER_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2}$").unwrap());

static STATE_CODES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| US_STATE_CODES.iter().copied().collect());

/// Exactly two ASCII letters, any case
pub fn is_two_letter_code(value: &str) -> bool {
    TWO_LETTER_CODE.is_match(value)
}

/// An upper-case US state, district or territory postal code
pub fn is_us_state_code(value: &str) -> bool {
    is_two_letter_code(value) && STATE_CODES.contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_letter_codes() {
        assert!(is_two_letter_code("WI"));
        assert!(is_two_letter_code("wi"));
        assert!(!is_two_letter_code("W1"));
        assert!(!is_two_letter_code("WIS"));
        assert!(!is_two_letter_code(""));
    }

    #[test]
    fn test_state_codes() {
        assert!(is_us_state_code("WI"));
        assert!(is_us_state_code("DC"));
        assert!(!is_us_state_code("wi"));
        assert!(!is_us_state_code("ZZ"));
    }
}
