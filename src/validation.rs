use std::sync::LazyLock;

use regex::Regex;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|\+213)[567][0-9]{8}$").expect("phone pattern is valid")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Algerian mobile number, either `0XXXXXXXXX` or `+213XXXXXXXXX`, with any
/// whitespace ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers() {
        assert!(is_valid_phone("0555123456"));
        assert!(is_valid_phone("+213 661 23 45 67"));
        assert!(is_valid_phone("0799999999"));
        assert!(!is_valid_phone("0455123456"));
        assert!(!is_valid_phone("055512345"));
        assert!(!is_valid_phone("+33612345678"));
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("fighter@gymfog.dz"));
        assert!(!is_valid_email("fighter@gymfog"));
        assert!(!is_valid_email("fight er@gymfog.dz"));
    }
}
