//! Phone number canonicalisation.
//!
//! Every place that stores or compares a customer phone number goes through [`normalize_phone`], so that
//! `0812-3456-7890`, `+62 812 3456 7890` and `6281234567890` all end up as `+6281234567890`.

pub const COUNTRY_CALLING_CODE: &str = "62";

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// Converts a phone number into the canonical `+62…` international form.
///
/// Returns `None` if the input does not contain a plausible phone number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = raw.chars().filter(char::is_ascii_digit).collect::<String>();
    let national = if let Some(rest) = digits.strip_prefix(COUNTRY_CALLING_CODE) {
        rest
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        digits.as_str()
    };
    let national = national.trim_start_matches('0');
    let len = national.len() + COUNTRY_CALLING_CODE.len();
    if national.is_empty() || !(MIN_DIGITS..=MAX_DIGITS).contains(&len) {
        return None;
    }
    Some(format!("+{COUNTRY_CALLING_CODE}{national}"))
}

/// Compares two phone numbers after normalisation. Numbers that cannot be normalised never match.
pub fn phones_match(a: &str, b: &str) -> bool {
    match (normalize_phone(a), normalize_phone(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn local_and_international_forms_agree() {
        let expected = Some("+6281234567890".to_string());
        assert_eq!(normalize_phone("081234567890"), expected);
        assert_eq!(normalize_phone("0812-3456-7890"), expected);
        assert_eq!(normalize_phone("+62 812 3456 7890"), expected);
        assert_eq!(normalize_phone("6281234567890"), expected);
        assert_eq!(normalize_phone("81234567890"), expected);
        assert_eq!(normalize_phone("(+62) 0812 3456 7890"), expected);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("   "), None);
        assert_eq!(normalize_phone("call me"), None);
        assert_eq!(normalize_phone("0812"), None);
        assert_eq!(normalize_phone("0812345678901234567"), None);
    }

    #[test]
    fn matching() {
        assert!(phones_match("081234567890", "+6281234567890"));
        assert!(!phones_match("081234567890", "081234567891"));
        assert!(!phones_match("", ""));
    }
}
