//! Envelope and header for the outgoing message.

use relaymail_smtp::Address;

/// Problems with command-line input, detected before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// `-to` was missing or empty.
    #[error("no recipients specified")]
    NoRecipients,

    /// An address cannot be sent as an SMTP parameter.
    #[error("invalid address")]
    InvalidAddress(#[source] relaymail_smtp::Error),
}

/// Everything the session needs besides the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Envelope sender.
    pub sender: Address,
    /// Envelope recipients, in command-line order.
    pub recipients: Vec<Address>,
    /// Trimmed subject; `None` when blank.
    pub subject: Option<String>,
}

impl Message {
    /// Builds a message for already parsed recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender contains a line break.
    pub fn new(sender: &str, recipients: Vec<Address>, subject: &str) -> Result<Self, InputError> {
        let sender = Address::new(sender).map_err(InputError::InvalidAddress)?;
        let subject = Some(subject.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(Self {
            sender,
            recipients,
            subject,
        })
    }

    /// Header block written ahead of the body: a `Subject:` line and the
    /// blank line ending the headers, or nothing without a subject.
    #[must_use]
    pub fn header(&self) -> Option<String> {
        self.subject
            .as_ref()
            .map(|subject| format!("Subject: {subject}\r\n\r\n"))
    }
}

/// Splits a comma-separated list into trimmed addresses.
///
/// Empty entries and duplicates are kept, so a list of only spaces yields one
/// empty address. Only the empty string is rejected.
///
/// # Errors
///
/// Returns [`InputError::NoRecipients`] for an empty list and
/// [`InputError::InvalidAddress`] for an entry containing a line break.
pub fn parse_recipients(raw: &str) -> Result<Vec<Address>, InputError> {
    if raw.is_empty() {
        return Err(InputError::NoRecipients);
    }
    raw.split(',')
        .map(|entry| Address::new(entry.trim()).map_err(InputError::InvalidAddress))
        .collect()
}
