//! SASL authentication mechanisms.
//!
//! An [`Authenticator`] only answers challenges. The SMTP exchange itself
//! (sending `AUTH`, base64 framing, reading `334`/`235` replies) is driven by
//! [`Client::authenticate`](crate::Client::authenticate).

use crate::connection::ServerInfo;
use crate::error::{Error, Result};
use crate::types::AuthMechanism;

/// Client side of a SASL mechanism.
pub trait Authenticator {
    /// Starts the exchange.
    ///
    /// Returns the mechanism to name in the `AUTH` command and an optional
    /// initial response to send with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the mechanism cannot be used against this server.
    fn begin(&self, server: &ServerInfo) -> Result<(AuthMechanism, Option<Vec<u8>>)>;

    /// Answers one server challenge.
    ///
    /// `challenge` is the decoded challenge text. `more` is true while the
    /// server is still asking (`334`) and false on its final acknowledgment.
    /// `Ok(None)` means there is nothing to send.
    ///
    /// # Errors
    ///
    /// Returns an error if the challenge cannot be answered; the exchange is
    /// then abandoned.
    fn respond(&self, challenge: &[u8], more: bool) -> Result<Option<Vec<u8>>>;
}

/// The `LOGIN` mechanism: the server prompts for `Username:` and then
/// `Password:`, each answered on its own line.
///
/// Prompts are matched after trimming surrounding whitespace and ignoring
/// case, which covers the variants Office 365 and friends send.
#[derive(Clone)]
pub struct LoginAuth {
    username: String,
    password: String,
}

impl LoginAuth {
    /// Creates a responder holding the given credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Authenticator for LoginAuth {
    fn begin(&self, _server: &ServerInfo) -> Result<(AuthMechanism, Option<Vec<u8>>)> {
        Ok((AuthMechanism::Login, None))
    }

    fn respond(&self, challenge: &[u8], more: bool) -> Result<Option<Vec<u8>>> {
        // Content of the final acknowledgment is not inspected.
        if !more {
            return Ok(None);
        }

        let prompt = String::from_utf8_lossy(challenge).trim().to_uppercase();
        match prompt.as_str() {
            "USERNAME:" => Ok(Some(self.username.as_bytes().to_vec())),
            "PASSWORD:" => Ok(Some(self.password.as_bytes().to_vec())),
            _ => Err(Error::UnexpectedChallenge),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Extension;
    use std::collections::HashSet;

    fn alice() -> LoginAuth {
        LoginAuth::new("alice", "secret1")
    }

    #[test]
    fn begin_names_login_without_initial_response() {
        let auth = LoginAuth::new("testuser", "testpass");

        let (mechanism, initial) = auth.begin(&ServerInfo::default()).unwrap();
        assert_eq!(mechanism.as_str(), "LOGIN");
        assert!(initial.is_none());

        let advertised = ServerInfo {
            hostname: "relay.example.net".into(),
            extensions: HashSet::from([Extension::Auth(vec![AuthMechanism::Plain])]),
        };
        let (mechanism, initial) = auth.begin(&advertised).unwrap();
        assert_eq!(mechanism, AuthMechanism::Login);
        assert!(initial.is_none());
    }

    #[test]
    fn username_prompt_variants() {
        let auth = LoginAuth::new("testuser", "testpass");
        for prompt in [
            "username:",
            "Username:",
            " username:",
            "username: ",
            " username: ",
            "\tUSERNAME:\r\n",
        ] {
            let got = auth.respond(prompt.as_bytes(), true).unwrap();
            assert_eq!(got.as_deref(), Some(&b"testuser"[..]), "prompt {prompt:?}");
        }
    }

    #[test]
    fn password_prompt_variants() {
        let auth = LoginAuth::new("testuser", "testpass");
        for prompt in [
            "password:",
            "Password:",
            " password:",
            "password: ",
            " password: ",
        ] {
            let got = auth.respond(prompt.as_bytes(), true).unwrap();
            assert_eq!(got.as_deref(), Some(&b"testpass"[..]), "prompt {prompt:?}");
        }
    }

    #[test]
    fn unknown_prompts_fail() {
        let auth = alice();
        for prompt in ["", " kjsdf ", "username", "user name:", "Password: please"] {
            let err = auth.respond(prompt.as_bytes(), true).unwrap_err();
            assert!(
                matches!(err, Error::UnexpectedChallenge),
                "prompt {prompt:?} gave {err:?}"
            );
            assert_eq!(err.to_string(), "unexpected server challenge");
        }
    }

    #[test]
    fn final_acknowledgment_is_ignored() {
        let auth = alice();
        assert!(auth.respond(b"", false).unwrap().is_none());
        assert!(auth.respond(b" kjsdf ", false).unwrap().is_none());
        assert!(
            auth.respond(b"2.7.0 Authentication successful", false)
                .unwrap()
                .is_none()
        );
        assert!(auth.respond(b"Username:", false).unwrap().is_none());
    }

    #[test]
    fn alice_scenario() {
        let auth = alice();
        assert_eq!(
            auth.respond(b" username: ", true).unwrap(),
            Some(b"alice".to_vec())
        );
        assert_eq!(
            auth.respond(b"PASSWORD:", true).unwrap(),
            Some(b"secret1".to_vec())
        );
        assert_eq!(auth.respond(b"", false).unwrap(), None);
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", alice());
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret1"));
    }
}
