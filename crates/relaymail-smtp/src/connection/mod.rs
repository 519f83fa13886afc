//! SMTP connection management with type-state pattern.

mod client;
mod data;
mod stream;
mod tls;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, SmtpConnection,
};
pub use data::DotStuffer;
pub use stream::{SmtpStream, connect};
pub use tls::TlsPolicy;

use crate::types::Extension;
use std::collections::HashSet;

/// Server capabilities from EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Checks if the server advertised AUTH at all.
    #[must_use]
    pub fn supports_auth(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Auth(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthMechanism;

    #[test]
    fn capability_queries() {
        let info = ServerInfo {
            hostname: "relay.example.net".into(),
            extensions: HashSet::from([
                Extension::StartTls,
                Extension::Size(Some(1024)),
                Extension::Auth(vec![AuthMechanism::Login]),
            ]),
        };
        assert!(info.supports_starttls());
        assert!(info.supports_auth());
        assert!(info.supports(&Extension::Size(Some(1024))));

        let bare = ServerInfo::default();
        assert!(!bare.supports_starttls());
        assert!(!bare.supports_auth());
    }
}
