//! Utility functions and types.

use std::fmt::Debug;

/// Redacts a token or secret by replacing all but the first and last three characters with asterisks.
///
/// - If the input string has fewer than 12 characters, it should be entirely redacted.
/// - If the input string has 12 or more characters, only the first three and the last three.
///
/// Lengths are counted in chars, not bytes.
///
/// The kept prefix and suffix are enough to tell two tokens apart in logs.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> Debug for Redact<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.chars().count();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 {
            f.write_str("***")
        } else {
            // Cut on char boundaries, tokens are not guaranteed to be ASCII.
            let head = self.0.char_indices().nth(3).map_or(0, |(i, _)| i);
            let tail = self
                .0
                .char_indices()
                .nth_back(2)
                .map_or(self.0.len(), |(i, _)| i);
            f.write_str(&self.0[..head])?;
            f.write_str("***")?;
            f.write_str(&self.0[tail..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("secret", "***"),
            ("eyJ0eXAiOiJKV1Qi", "eyJ***1Qi"),
            ("client-secret-value", "cli***lue"),
            ("", "EMPTY"),
            ("12345678901", "***"),
            ("ключ-доступа-секрет", "клю***рет"),
            ("пароль-тест", "***"),
            ("🔑🔑🔑-token-🔒🔒🔒", "🔑🔑🔑***🔒🔒🔒"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }
}
