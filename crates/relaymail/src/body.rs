//! Message body source.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf, Stdin};
use tracing::debug;

/// Failure to open the body file.
#[derive(Debug, thiserror::Error)]
#[error("failed to open body file at `{}`", path.display())]
pub struct BodyError {
    /// Path that was tried.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}

/// Where the message body comes from.
///
/// The value owns its handle: a file is closed when the source is dropped,
/// standard input is left open for the process.
#[derive(Debug)]
pub enum BodySource {
    /// Standard input.
    Stdin(Stdin),
    /// A file given on the command line.
    File(File),
}

impl BodySource {
    /// Opens `path`, or standard input when no (or an empty) path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub async fn open(path: Option<&Path>) -> Result<Self, BodyError> {
        match path.filter(|p| !p.as_os_str().is_empty()) {
            None => {
                debug!("reading body from standard input");
                Ok(Self::Stdin(tokio::io::stdin()))
            }
            Some(path) => {
                let file = File::open(path).await.map_err(|source| BodyError {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "reading body from file");
                Ok(Self::File(file))
            }
        }
    }

    /// Returns true if the body comes from a file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl AsyncRead for BodySource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Stdin(stdin) => Pin::new(stdin).poll_read(cx, buf),
            Self::File(file) => Pin::new(file).poll_read(cx, buf),
        }
    }
}
