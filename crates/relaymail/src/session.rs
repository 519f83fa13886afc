//! Single-message SMTP session.
//!
//! A [`Session`] walks one connection through a fixed sequence of steps and
//! stops at the first failure:
//!
//! ```text
//! Init → Connected → Secured → Authenticated → SenderSet → RecipientsSet
//!      → DataOpen → DataSent → Closed → Terminated
//! ```
//!
//! Any failed step moves the session to [`SessionState::Failed`], after which
//! nothing else is sent. The wire work is delegated to a [`Transport`].

use std::fmt;
use std::io;

use relaymail_smtp::{Address, Authenticator};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::message::Message;

/// Size of the buffer used to stream the body.
const BODY_CHUNK: usize = 8 * 1024;

/// Progress of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing sent yet.
    Init,
    /// TCP connection open, greeting received.
    Connected,
    /// STARTTLS completed.
    Secured,
    /// AUTH accepted.
    Authenticated,
    /// MAIL FROM accepted.
    SenderSet,
    /// Every RCPT TO accepted.
    RecipientsSet,
    /// DATA accepted, content may be written.
    DataOpen,
    /// Header and body written.
    DataSent,
    /// End of data acknowledged by the server.
    Closed,
    /// QUIT acknowledged.
    Terminated,
    /// A step failed; the session is finished.
    Failed,
}

impl SessionState {
    /// The only state reachable from `self` on success, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Connected),
            Self::Connected => Some(Self::Secured),
            Self::Secured => Some(Self::Authenticated),
            Self::Authenticated => Some(Self::SenderSet),
            Self::SenderSet => Some(Self::RecipientsSet),
            Self::RecipientsSet => Some(Self::DataOpen),
            Self::DataOpen => Some(Self::DataSent),
            Self::DataSent => Some(Self::Closed),
            Self::Closed => Some(Self::Terminated),
            Self::Terminated | Self::Failed => None,
        }
    }

    /// Returns true when no further step can run.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The protocol operations a session needs from the wire.
///
/// Each call corresponds to one session step and must only be issued after
/// the previous one succeeded.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Opens the TCP connection and reads the greeting.
    async fn connect(&mut self, host: &str, port: u16) -> relaymail_smtp::Result<()>;

    /// Greets the server and upgrades the connection with STARTTLS.
    async fn starttls(&mut self, host: &str) -> relaymail_smtp::Result<()>;

    /// Runs the SASL exchange.
    async fn authenticate(&mut self, auth: &dyn Authenticator) -> relaymail_smtp::Result<()>;

    /// Declares the envelope sender.
    async fn mail_from(&mut self, from: &Address) -> relaymail_smtp::Result<()>;

    /// Declares one envelope recipient.
    async fn rcpt_to(&mut self, to: &Address) -> relaymail_smtp::Result<()>;

    /// Opens the data stream.
    async fn data(&mut self) -> relaymail_smtp::Result<()>;

    /// Writes message content to the open data stream.
    async fn write_data(&mut self, content: &[u8]) -> relaymail_smtp::Result<()>;

    /// Ends the data stream and waits for the server's verdict.
    async fn finish_data(&mut self) -> relaymail_smtp::Result<()>;

    /// Ends the session.
    async fn quit(&mut self) -> relaymail_smtp::Result<()>;
}

/// Why a session stopped.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The message has no recipients.
    #[error("no recipients specified")]
    NoRecipients,

    /// TCP connection or greeting failed.
    #[error("failed to connect to server `{server}`")]
    Connect {
        /// `host:port` that was dialed.
        server: String,
        /// Underlying error.
        #[source]
        source: relaymail_smtp::Error,
    },

    /// STARTTLS or the TLS handshake failed.
    #[error("failed to start secure connection")]
    Tls(#[source] relaymail_smtp::Error),

    /// The SASL exchange failed.
    #[error("failed to authenticate with server")]
    Auth(#[source] relaymail_smtp::Error),

    /// MAIL FROM was refused.
    #[error("failed to set sender '{address}'")]
    Sender {
        /// Sender address.
        address: String,
        /// Underlying error.
        #[source]
        source: relaymail_smtp::Error,
    },

    /// RCPT TO was refused.
    #[error("failed to set recipient '{address}'")]
    Recipient {
        /// Recipient address that was refused.
        address: String,
        /// Underlying error.
        #[source]
        source: relaymail_smtp::Error,
    },

    /// DATA was refused.
    #[error("failed to issue data command")]
    Data(#[source] relaymail_smtp::Error),

    /// Writing the subject header failed.
    #[error("failed to send subject")]
    Subject(#[source] relaymail_smtp::Error),

    /// Reading the body source failed.
    #[error("failed to read body")]
    ReadBody(#[source] io::Error),

    /// Writing the body failed.
    #[error("failed to send body")]
    WriteBody(#[source] relaymail_smtp::Error),

    /// The server rejected the end of data.
    #[error("failed to close data")]
    Close(#[source] relaymail_smtp::Error),

    /// QUIT failed.
    #[error("failed to close client")]
    Quit(#[source] relaymail_smtp::Error),

    /// A step was attempted out of sequence.
    #[error("session step {to} attempted from {from}")]
    OutOfOrder {
        /// State the session was in.
        from: SessionState,
        /// State the step would have entered.
        to: SessionState,
    },
}

/// Where to relay the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    /// Hostname, also used as the TLS server name.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One message over one connection.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    state: SessionState,
}

impl<T: Transport> Session<T> {
    /// Creates a session in [`SessionState::Init`].
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            state: SessionState::Init,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Consumes the session, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Sends `message` with `body` as its content.
    ///
    /// `body` is consumed and dropped once it has been streamed, or as soon
    /// as the session fails, so a file handle is closed exactly once on every
    /// path.
    ///
    /// # Errors
    ///
    /// Returns the first failing step; the session is then
    /// [`SessionState::Failed`] and no further command has been sent.
    pub async fn send<R>(
        &mut self,
        relay: &Relay,
        auth: &dyn Authenticator,
        message: &Message,
        mut body: R,
    ) -> Result<(), SendError>
    where
        R: AsyncRead + Unpin,
    {
        if self.state != SessionState::Init {
            return Err(SendError::OutOfOrder {
                from: self.state,
                to: SessionState::Connected,
            });
        }
        if message.recipients.is_empty() {
            self.state = SessionState::Failed;
            return Err(SendError::NoRecipients);
        }

        let outcome = self
            .transport
            .connect(&relay.host, relay.port)
            .await
            .map_err(|source| SendError::Connect {
                server: relay.to_string(),
                source,
            });
        self.settle(SessionState::Connected, outcome)?;

        let outcome = self
            .transport
            .starttls(&relay.host)
            .await
            .map_err(SendError::Tls);
        self.settle(SessionState::Secured, outcome)?;

        let outcome = self
            .transport
            .authenticate(auth)
            .await
            .map_err(SendError::Auth);
        self.settle(SessionState::Authenticated, outcome)?;

        let outcome = self
            .transport
            .mail_from(&message.sender)
            .await
            .map_err(|source| SendError::Sender {
                address: message.sender.to_string(),
                source,
            });
        self.settle(SessionState::SenderSet, outcome)?;

        let outcome = self.declare_recipients(&message.recipients).await;
        self.settle(SessionState::RecipientsSet, outcome)?;

        let outcome = self.transport.data().await.map_err(SendError::Data);
        self.settle(SessionState::DataOpen, outcome)?;

        let outcome = self.write_content(message, &mut body).await;
        drop(body);
        let copied = self.settle(SessionState::DataSent, outcome)?;
        debug!(bytes = copied, "body streamed");

        let outcome = self.transport.finish_data().await.map_err(SendError::Close);
        self.settle(SessionState::Closed, outcome)?;

        let outcome = self.transport.quit().await.map_err(SendError::Quit);
        self.settle(SessionState::Terminated, outcome)?;

        info!(
            relay = %relay,
            recipients = message.recipients.len(),
            "message sent"
        );
        Ok(())
    }

    async fn declare_recipients(&mut self, recipients: &[Address]) -> Result<(), SendError> {
        for to in recipients {
            self.transport
                .rcpt_to(to)
                .await
                .map_err(|source| SendError::Recipient {
                    address: to.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn write_content<R>(&mut self, message: &Message, body: &mut R) -> Result<u64, SendError>
    where
        R: AsyncRead + Unpin,
    {
        if let Some(header) = message.header() {
            self.transport
                .write_data(header.as_bytes())
                .await
                .map_err(SendError::Subject)?;
        }

        let mut buf = vec![0u8; BODY_CHUNK];
        let mut copied = 0u64;
        loop {
            let n = body.read(&mut buf).await.map_err(SendError::ReadBody)?;
            if n == 0 {
                return Ok(copied);
            }
            self.transport
                .write_data(&buf[..n])
                .await
                .map_err(SendError::WriteBody)?;
            copied += n as u64;
        }
    }

    /// Moves to `to` when `outcome` succeeded, or to `Failed` otherwise.
    fn settle<V>(&mut self, to: SessionState, outcome: Result<V, SendError>) -> Result<V, SendError> {
        match outcome {
            Ok(value) => {
                self.advance(to)?;
                Ok(value)
            }
            Err(e) => {
                debug!(state = %self.state, error = %e, "session failed");
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    fn advance(&mut self, to: SessionState) -> Result<(), SendError> {
        if self.state.next() != Some(to) {
            let from = self.state;
            self.state = SessionState::Failed;
            return Err(SendError::OutOfOrder { from, to });
        }
        debug!(from = %self.state, to = %to, "session step");
        self.state = to;
        Ok(())
    }
}
