//! Envelope address type.

use crate::error::{Error, Result};

/// Address used in `MAIL FROM` and `RCPT TO`.
///
/// Only line breaks are rejected, since they would terminate the command
/// early. Anything else, including the empty string, is forwarded and left
/// for the server to judge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address contains a CR or LF character.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        if addr.contains(['\r', '\n']) {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} contains a line break"
            )));
        }
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.to_string(), "user@example.com");
    }

    #[test]
    fn test_unvalidated_forms_pass_through() {
        assert_eq!(Address::new("").unwrap().as_str(), "");
        assert_eq!(Address::new("postmaster").unwrap().as_str(), "postmaster");
    }

    #[test]
    fn test_line_breaks_rejected() {
        assert!(matches!(
            Address::new("a@b.c\r\nRCPT TO:<x@y.z>"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(Address::new("a@b.c\n").is_err());
    }
}
