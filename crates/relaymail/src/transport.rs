//! [`Transport`] backed by the type-state SMTP client.

use relaymail_smtp::connection::connect;
use relaymail_smtp::{
    Address, Authenticated, Authenticator, Client, Connected, Data, Error, MailTransaction,
    RecipientAdded, Result, TlsPolicy,
};

use crate::session::Transport;

/// Name announced in EHLO.
const CLIENT_HOSTNAME: &str = "localhost";

/// Client in whichever state the last successful step left it.
#[derive(Debug, Default)]
enum Stage {
    #[default]
    Idle,
    Connected(Client<Connected>),
    Authenticated(Client<Authenticated>),
    Mail(Client<MailTransaction>),
    Recipients(Client<RecipientAdded>),
    Data(Client<Data>),
    Delivered(Client<Connected>),
    Closed,
}

impl Stage {
    const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connected(_) => "connected",
            Self::Authenticated(_) => "authenticated",
            Self::Mail(_) => "mail transaction",
            Self::Recipients(_) => "recipients",
            Self::Data(_) => "data",
            Self::Delivered(_) => "delivered",
            Self::Closed => "closed",
        }
    }
}

/// SMTP over TCP with STARTTLS.
///
/// The underlying client is consumed by every step; a failed step leaves the
/// transport closed and drops the connection.
#[derive(Debug, Default)]
pub struct SmtpTransport {
    policy: TlsPolicy,
    stage: Stage,
}

impl SmtpTransport {
    /// Creates an unconnected transport using `policy` for STARTTLS.
    #[must_use]
    pub fn new(policy: TlsPolicy) -> Self {
        Self {
            policy,
            stage: Stage::Idle,
        }
    }

    fn take(&mut self) -> Stage {
        std::mem::replace(&mut self.stage, Stage::Closed)
    }

    fn misplaced(&mut self, stage: Stage, operation: &str) -> Error {
        let err = Error::InvalidState(format!("{operation} while {}", stage.name()));
        self.stage = stage;
        err
    }
}

impl Transport for SmtpTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        match self.take() {
            Stage::Idle => {
                let stream = connect(host, port).await?;
                let client = Client::from_stream(stream).await?;
                self.stage = Stage::Connected(client);
                Ok(())
            }
            other => Err(self.misplaced(other, "connect")),
        }
    }

    async fn starttls(&mut self, host: &str) -> Result<()> {
        match self.take() {
            Stage::Connected(client) => {
                let client = client.ehlo(CLIENT_HOSTNAME).await?;
                let client = client.starttls(host, self.policy).await?;
                self.stage = Stage::Connected(client);
                Ok(())
            }
            other => Err(self.misplaced(other, "STARTTLS")),
        }
    }

    async fn authenticate(&mut self, auth: &dyn Authenticator) -> Result<()> {
        match self.take() {
            Stage::Connected(client) => {
                self.stage = Stage::Authenticated(client.authenticate(auth).await?);
                Ok(())
            }
            other => Err(self.misplaced(other, "AUTH")),
        }
    }

    async fn mail_from(&mut self, from: &Address) -> Result<()> {
        match self.take() {
            Stage::Authenticated(client) => {
                self.stage = Stage::Mail(client.mail_from(from.clone()).await?);
                Ok(())
            }
            other => Err(self.misplaced(other, "MAIL FROM")),
        }
    }

    async fn rcpt_to(&mut self, to: &Address) -> Result<()> {
        match self.take() {
            Stage::Mail(client) => {
                self.stage = Stage::Recipients(client.rcpt_to(to.clone()).await?);
                Ok(())
            }
            Stage::Recipients(client) => {
                self.stage = Stage::Recipients(client.rcpt_to(to.clone()).await?);
                Ok(())
            }
            other => Err(self.misplaced(other, "RCPT TO")),
        }
    }

    async fn data(&mut self) -> Result<()> {
        match self.take() {
            Stage::Recipients(client) => {
                self.stage = Stage::Data(client.data().await?);
                Ok(())
            }
            other => Err(self.misplaced(other, "DATA")),
        }
    }

    async fn write_data(&mut self, content: &[u8]) -> Result<()> {
        match &mut self.stage {
            Stage::Data(client) => client.write(content).await,
            other => Err(Error::InvalidState(format!(
                "message content while {}",
                other.name()
            ))),
        }
    }

    async fn finish_data(&mut self) -> Result<()> {
        match self.take() {
            Stage::Data(client) => {
                self.stage = Stage::Delivered(client.finish().await?);
                Ok(())
            }
            other => Err(self.misplaced(other, "end of data")),
        }
    }

    async fn quit(&mut self) -> Result<()> {
        match self.take() {
            Stage::Delivered(client) | Stage::Connected(client) => client.quit().await,
            Stage::Authenticated(client) => client.quit().await,
            Stage::Mail(client) => client.quit().await,
            Stage::Recipients(client) => client.quit().await,
            Stage::Data(client) => client.quit().await,
            Stage::Idle | Stage::Closed => Ok(()),
        }
    }
}
