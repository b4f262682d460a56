//! Field-level validators shared by rule validation and bulk import.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed suffix every SuiNS name must carry.
pub const SUINS_SUFFIX: &str = ".sui";

/// Total length bounds for a SuiNS name, suffix included.
const SUINS_MIN_LEN: usize = 4;
const SUINS_MAX_LEN: usize = 64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("address regex"));

static SUINS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?\.sui$").expect("suins regex"));

/// Structural email check: one `@`, a dot in the domain, no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Chain-address check: `0x` followed by exactly 64 hex characters.
pub fn is_valid_address(value: &str) -> bool {
    ADDRESS_RE.is_match(value)
}

/// SuiNS name check: lowercase alphanumerics and inner hyphens, the
/// `.sui` suffix, and a total length of 4-64 characters.
pub fn is_valid_suins_name(value: &str) -> bool {
    if value.len() < SUINS_MIN_LEN || value.len() > SUINS_MAX_LEN {
        return false;
    }
    SUINS_RE.is_match(value)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("has space@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_valid_addresses() {
        let addr = format!("0x{}", "ab".repeat(32));
        assert!(is_valid_address(&addr));
        let upper = format!("0x{}", "AB".repeat(32));
        assert!(is_valid_address(&upper));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_address("0x123")); // too short
        assert!(!is_valid_address(&"ab".repeat(33))); // no 0x prefix
        assert!(!is_valid_address(&format!("0x{}", "zz".repeat(32)))); // not hex
        assert!(!is_valid_address(&format!("0x{}", "ab".repeat(33)))); // too long
    }

    #[test]
    fn test_valid_suins_names() {
        assert!(is_valid_suins_name("alice.sui"));
        assert!(is_valid_suins_name("my-name-42.sui"));
        assert!(is_valid_suins_name("a.sui")); // 5 chars, above minimum
    }

    #[test]
    fn test_suins_length_bounds() {
        // 3 chars: below minimum
        assert!(!is_valid_suins_name("sui"));
        // 64 chars total: exactly at maximum
        let name = format!("{}{}", "a".repeat(60), SUINS_SUFFIX);
        assert_eq!(name.len(), 64);
        assert!(is_valid_suins_name(&name));
        // 65 chars: over
        let name = format!("{}{}", "a".repeat(61), SUINS_SUFFIX);
        assert!(!is_valid_suins_name(&name));
    }

    #[test]
    fn test_suins_suffix_required() {
        assert!(!is_valid_suins_name("alice"));
        assert!(!is_valid_suins_name("alice.eth"));
        assert!(!is_valid_suins_name("alice.sui.com"));
    }

    #[test]
    fn test_suins_character_rules() {
        assert!(!is_valid_suins_name("Alice.sui")); // uppercase
        assert!(!is_valid_suins_name("-alice.sui")); // leading hyphen
        assert!(!is_valid_suins_name("alice-.sui")); // trailing hyphen
        assert!(!is_valid_suins_name("al ice.sui")); // whitespace
    }
}
