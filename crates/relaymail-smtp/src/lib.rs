//! # relaymail-smtp
//!
//! A small SMTP submission client: one connection, one message.
//!
//! ## Features
//!
//! - **Type-state connection management**: the compiler rejects commands
//!   issued out of order
//! - **STARTTLS** with an optional relaxed certificate policy for internal relays
//! - **SASL** through the [`Authenticator`] trait, with the `LOGIN` mechanism
//!   ([`LoginAuth`]) built in
//! - **Streaming DATA**: message content is copied from any `AsyncRead`
//!   with dot-stuffing and nothing else
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaymail_smtp::{Address, Client, LoginAuth, TlsPolicy};
//! use relaymail_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> relaymail_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 587).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.ehlo("localhost").await?;
//!     let client = client
//!         .starttls("smtp.example.com", TlsPolicy::Verify)
//!         .await?;
//!
//!     let auth = LoginAuth::new("user@example.com", "password");
//!     let client = client.authenticate(&auth).await?;
//!
//!     let client = client.mail_from(Address::new("user@example.com")?).await?;
//!     let client = client.rcpt_to(Address::new("friend@example.com")?).await?;
//!     let mut client = client.data().await?;
//!     client.write(b"Subject: Test\r\n\r\nHello, World!\r\n").await?;
//!     let client = client.finish().await?;
//!
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Connected ── ehlo()/starttls() ──→ Connected
//!     │
//!     └── authenticate() ──→ Authenticated ── mail_from() ──→ MailTransaction
//!                                                                 │
//!             Connected ←── finish() ── Data ←── data() ── RecipientAdded
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use auth::{Authenticator, LoginAuth};
pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpConnection, SmtpStream, TlsPolicy,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
