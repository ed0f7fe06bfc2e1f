//! Gift card lookup key derived from a customer-entered code.

use core::fmt;

/// Number of trailing code characters used to look up a gift card.
///
/// Shopify only exposes the last four characters of a gift card code
/// (`lastCharacters`), so that is all a lookup can compare against.
pub const KEY_LENGTH: usize = 4;

/// Canonicalize a customer-entered gift card code.
///
/// Removes every whitespace character (spaces, tabs, line breaks, including
/// Unicode whitespace) and uppercases what remains.
///
/// ```
/// use guna_core::normalize_code;
///
/// assert_eq!(normalize_code("gift 1234"), "GIFT1234");
/// assert_eq!(normalize_code(" ab\tcd\nef "), "ABCDEF");
/// ```
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// The key a gift card lookup matches on: the trailing characters of a
/// normalized code.
///
/// ## Security
///
/// Only the last [`KEY_LENGTH`] characters take part in matching; the rest
/// of the submitted code is never checked against the upstream record. Any
/// two codes sharing a suffix resolve to the same card, so the key space an
/// attacker has to guess is small. Callers must rate limit lookups.
///
/// ## Examples
///
/// ```
/// use guna_core::LookupKey;
///
/// assert_eq!(LookupKey::from_code("gift 1234").as_str(), "1234");
/// assert_eq!(LookupKey::from_code("abcd efgh").as_str(), "EFGH");
///
/// // Short codes are kept whole
/// assert_eq!(LookupKey::from_code("x9").as_str(), "X9");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Derive the lookup key from a raw or already-normalized code.
    ///
    /// Codes shorter than [`KEY_LENGTH`] after normalization produce a
    /// shorter key rather than an error; such a key can never equal a
    /// four-character `lastCharacters` value.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let normalized = normalize_code(code);
        let len = normalized.chars().count();
        let key = normalized
            .chars()
            .skip(len.saturating_sub(KEY_LENGTH))
            .collect();
        Self(key)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Returns `true` if the code normalized to nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LookupKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_whitespace_and_uppercases() {
        assert_eq!(normalize_code("gift 1234"), "GIFT1234");
        assert_eq!(normalize_code("  a b  c d  "), "ABCD");
        assert_eq!(normalize_code("x\u{00A0}y\u{2003}z"), "XYZ");
    }

    #[test]
    fn test_key_is_trailing_four_characters() {
        let key = LookupKey::from_code("gift 1234");
        assert_eq!(key.as_str(), "1234");
        assert_eq!(key.len(), KEY_LENGTH);
    }

    #[test]
    fn test_key_lowercase_suffix_is_uppercased() {
        assert_eq!(LookupKey::from_code("xxxx-abcd").as_str(), "ABCD");
    }

    #[test]
    fn test_short_code_keeps_whole_string() {
        let key = LookupKey::from_code(" a b ");
        assert_eq!(key.as_str(), "AB");
        assert_eq!(key.len(), 2);
    }

    #[test]
    fn test_whitespace_only_code_is_empty() {
        assert!(LookupKey::from_code(" \t\n ").is_empty());
    }

    #[test]
    fn test_key_counts_characters_not_bytes() {
        assert_eq!(LookupKey::from_code("code-ÄÖÜß").as_str(), "ÖÜSS");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for code in ["gift 1234", "abcd efgh ijkl", "x", "", "ÄÖÜ 12"] {
            let once = normalize_code(code);
            assert_eq!(normalize_code(&once), once);

            let key = LookupKey::from_code(code);
            assert_eq!(LookupKey::from_code(key.as_str()), key);
        }
    }
}
