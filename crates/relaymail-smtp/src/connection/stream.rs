//! Low-level SMTP stream handling.

use super::tls::{TlsPolicy, create_tls_connector};
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Returns true once the stream has been upgraded with STARTTLS.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one line, without its line ending.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the server closed the connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
        };
        if read == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a TCP stream to TLS.
    ///
    /// `hostname` is used both for SNI and, under [`TlsPolicy::Verify`], as
    /// the identity the certificate must match.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted, the hostname is
    /// not a valid server name, or the TLS handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str, policy: TlsPolicy) -> Result<Self> {
        let tcp_stream = match self {
            Self::Tcp(reader) => {
                if !reader.buffer().is_empty() {
                    return Err(Error::Protocol(
                        "Server sent data before the TLS handshake".into(),
                    ));
                }
                reader.into_inner()
            }
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };

        let connector = create_tls_connector(policy);
        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

        let tls_stream = connector.connect(server_name, tcp_stream).await?;
        debug!(hostname, ?policy, "TLS handshake complete");
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    debug!(%addr, "connecting");
    let stream = TcpStream::connect(&addr).await?;
    Ok(SmtpStream::Tcp(BufReader::new(stream)))
}
