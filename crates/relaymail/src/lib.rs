//! `relaymail` - send one e-mail through an authenticated SMTP relay.
//!
//! The binary wires command-line input, the JSON configuration and the body
//! source into a [`session::Session`], which drives the SMTP exchange through
//! [`transport::SmtpTransport`].

pub mod body;
pub mod cli;
pub mod config;
pub mod message;
pub mod session;
pub mod transport;

use relaymail_smtp::{LoginAuth, TlsPolicy};
use tracing::debug;

use crate::body::BodySource;
use crate::cli::Cli;
use crate::config::Config;
use crate::message::{Message, parse_recipients};
use crate::session::Session;
use crate::transport::SmtpTransport;

/// Sends the message described by `cli`.
///
/// Recipients are checked before anything else is touched, so a missing
/// `-to` is reported even without a usable configuration file.
///
/// # Errors
///
/// Returns the first input, configuration, body or session error.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let recipients = parse_recipients(&cli.to)?;
    let config = Config::load(cli.config.as_deref()).await?;
    let message = Message::new(&config.sender, recipients, &cli.subject)?;
    debug!(?config, recipients = message.recipients.len(), "input ready");

    let body = BodySource::open(cli.body.as_deref()).await?;

    let policy = if cli.tls_verify {
        TlsPolicy::Verify
    } else {
        TlsPolicy::AcceptInvalidCerts
    };
    let auth = LoginAuth::new(config.username.clone(), config.password.clone());

    let mut session = Session::new(SmtpTransport::new(policy));
    session.send(&config.relay(), &auth, &message, body).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::message::InputError;

    fn cli(to: &str, config: std::path::PathBuf) -> Cli {
        Cli {
            config: Some(config),
            subject: String::new(),
            body: None,
            to: to.to_string(),
            verbose: false,
            tls_verify: false,
        }
    }

    #[tokio::test]
    async fn missing_recipients_reported_before_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(cli("", dir.path().join("absent.json")))
            .await
            .unwrap_err();
        assert!(
            matches!(err.downcast_ref::<InputError>(), Some(InputError::NoRecipients)),
            "got {err:#}"
        );
    }

    #[tokio::test]
    async fn config_is_read_once_recipients_are_present() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(cli("bob@example.com", dir.path().join("absent.json")))
            .await
            .unwrap_err();
        assert!(
            matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Open { .. })),
            "got {err:#}"
        );
    }
}
