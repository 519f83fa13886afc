//! Type-state SMTP client.

use super::data::DotStuffer;
use super::tls::TlsPolicy;
use super::{ServerInfo, SmtpStream};
use crate::auth::Authenticator;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, Extension, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;
use std::marker::PhantomData;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

/// Size of the buffer used when streaming message content.
const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    client_hostname: String,
    stuffer: DotStuffer,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns true once the connection is encrypted.
    fn is_tls(&self) -> bool;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn is_tls(&self) -> bool {
        self.stream.is_tls()
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(greeting.into_error());
        }

        // First word of the greeting is the server's name
        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        debug!(server = %hostname, "greeting received");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
            },
            client_hostname: String::from("localhost"),
            stuffer: DotStuffer::new(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        self.client_hostname = client_hostname.to_string();
        self.refresh_extensions().await?;
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS.
    ///
    /// `hostname` is the server identity expected in the certificate. EHLO is
    /// sent again over the encrypted channel, since the server may advertise
    /// different extensions (typically AUTH) after the upgrade.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(mut self, hostname: &str, policy: TlsPolicy) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.send_command(Command::StartTls).await?;
        if reply.code != ReplyCode::SERVICE_READY {
            return Err(reply.into_error());
        }

        self.stream = self.stream.upgrade_to_tls(hostname, policy).await?;
        self.refresh_extensions().await?;

        Ok(self)
    }

    /// Authenticates with a SASL mechanism.
    ///
    /// Drives the challenge/response loop: every `334` challenge is base64
    /// decoded and handed to [`Authenticator::respond`] with `more = true`,
    /// the final `235` text is handed over with `more = false`. If the
    /// authenticator fails, the exchange is cancelled with `*` and its error
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server does not offer AUTH,
    /// [`Error::AuthFailed`] if the server rejects the exchange, or the
    /// authenticator's own error.
    pub async fn authenticate<A>(mut self, auth: &A) -> Result<Client<Authenticated>>
    where
        A: Authenticator + ?Sized,
    {
        if !self.server_info.supports_auth() {
            return Err(Error::NotSupported("AUTH".into()));
        }

        let (mechanism, initial) = auth.begin(&self.server_info)?;
        debug!(%mechanism, "starting authentication");

        let cmd = Command::Auth {
            mechanism,
            initial_response: initial.map(|resp| STANDARD.encode(resp)),
        };
        let mut reply = self.send_command(cmd).await?;

        loop {
            match reply.code {
                ReplyCode::AUTH_CONTINUE => {
                    let text = reply.message_text();
                    let challenge = match STANDARD.decode(text.trim()) {
                        Ok(challenge) => challenge,
                        Err(e) => {
                            self.cancel_auth().await;
                            return Err(Error::Protocol(format!(
                                "Undecodable authentication challenge: {e}"
                            )));
                        }
                    };
                    let response = match auth.respond(&challenge, true) {
                        Ok(response) => response.unwrap_or_default(),
                        Err(e) => {
                            self.cancel_auth().await;
                            return Err(e);
                        }
                    };
                    reply = self
                        .send_command(Command::AuthResponse(STANDARD.encode(response)))
                        .await?;
                }
                ReplyCode::AUTH_SUCCESS => {
                    auth.respond(reply.message_text().as_bytes(), false)?;
                    debug!(%mechanism, "authenticated");
                    return Ok(self.transition());
                }
                code => {
                    return Err(Error::AuthFailed {
                        code: code.as_u16(),
                        message: reply.message_text(),
                    });
                }
            }
        }
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        self.start_mail(from).await?;
        Ok(self.transition())
    }

    async fn refresh_extensions(&mut self) -> Result<()> {
        let cmd = Command::Ehlo {
            hostname: self.client_hostname.clone(),
        };
        let reply = self.send_command(cmd).await?;
        if reply.code != ReplyCode::OK {
            return Err(reply.into_error());
        }

        // First line is the greeting, the rest are keywords
        self.server_info.extensions = reply
            .message
            .iter()
            .skip(1)
            .map(String::as_str)
            .map(Extension::parse)
            .collect();
        debug!(extensions = ?self.server_info.extensions, "EHLO accepted");
        Ok(())
    }

    async fn cancel_auth(&mut self) {
        match self.send_command(Command::AuthCancel).await {
            Ok(reply) => debug!(code = %reply.code, "authentication cancelled"),
            Err(e) => debug!(error = %e, "authentication cancel failed"),
        }
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        self.start_mail(from).await?;
        Ok(self.transition())
    }
}

impl Client<MailTransaction> {
    /// Adds the first recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.add_recipient(to).await?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        self.add_recipient(to).await?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.send_command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error());
        }

        let mut client: Client<Data> = self.transition();
        client.stuffer = DotStuffer::new();
        Ok(client)
    }
}

impl Client<Data> {
    /// Writes message content.
    ///
    /// Content is sent as is apart from dot-stuffing; line endings are not
    /// rewritten. May be called any number of times before [`finish`](Self::finish).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write(&mut self, content: &[u8]) -> Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        let mut out = Vec::with_capacity(content.len());
        self.stuffer.stuff(content, &mut out);
        self.stream.write_all(&out).await
    }

    /// Streams `reader` to the server until end of input.
    ///
    /// Returns the number of content bytes copied.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source or writing to the server fails.
    pub async fn copy_from<R>(&mut self, reader: &mut R) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut copied = 0u64;
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.write(&buf[..n]).await?;
            copied += n as u64;
        }
        trace!(copied, "message content streamed");
        Ok(copied)
    }

    /// Ends the DATA phase and waits for the server to accept the message.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the terminator fails or the server rejects
    /// the message.
    pub async fn finish(mut self) -> Result<Client<Connected>> {
        let terminator = self.stuffer.terminator();
        self.stream.write_all(terminator).await?;

        let reply = read_reply(&mut self.stream).await?;
        if reply.code != ReplyCode::OK {
            return Err(reply.into_error());
        }
        debug!(
            bytes = self.stuffer.content_len(),
            reply = %reply.message_text(),
            "message accepted"
        );

        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S> Client<S> {
    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            client_hostname: self.client_hostname,
            stuffer: self.stuffer,
            _state: PhantomData,
        }
    }

    async fn start_mail(&mut self, from: Address) -> Result<()> {
        let reply = self.send_command(Command::MailFrom { from }).await?;
        if reply.code != ReplyCode::OK {
            return Err(reply.into_error());
        }
        Ok(())
    }

    async fn add_recipient(&mut self, to: Address) -> Result<()> {
        let reply = self.send_command(Command::RcptTo { to }).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        Ok(())
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        if cmd.is_sensitive() {
            trace!("C: <credentials>");
        } else {
            trace!(command = ?cmd, "C:");
        }
        self.stream.write_all(&cmd.serialize()).await?;
        let reply = read_reply(&mut self.stream).await?;
        trace!(code = %reply.code, "S:");
        Ok(reply)
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails or the server answers
    /// with anything but `221`.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;
        if reply.code != ReplyCode::CLOSING {
            return Err(reply.into_error());
        }
        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        // Too short to continue; let the parser reject it
        let is_last = line.len() < 4 || is_last_reply_line(&line);
        lines.push(line);
        if is_last {
            break;
        }
    }
    parse_reply(&lines)
}
