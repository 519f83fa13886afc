//! DATA transparency (RFC 5321 §4.5.2).
//!
//! Only CRLF starts a new line. Content with bare LF line endings is sent as
//! is, so a Unix-format `\n.\n` line goes out unstuffed; a server that also
//! accepts bare LF as a line ending may take it as the end of the message.
//! Callers that send such content should convert it to CRLF first.

/// Incremental dot-stuffer for message content.
///
/// Content is passed through byte for byte except that a `.` opening a line
/// is doubled. Lines are delimited by CRLF; bare LF and bare CR are data and
/// are not normalized.
#[derive(Debug, Clone)]
pub struct DotStuffer {
    at_line_start: bool,
    prev_cr: bool,
    written: u64,
}

impl Default for DotStuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DotStuffer {
    /// Creates a stuffer positioned at the start of the message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            at_line_start: true,
            prev_cr: false,
            written: 0,
        }
    }

    /// Appends `input` to `out`, stuffing leading dots.
    pub fn stuff(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.reserve(input.len() + 8);
        for &byte in input {
            if self.at_line_start && byte == b'.' {
                out.push(b'.');
            }
            out.push(byte);
            self.at_line_start = self.prev_cr && byte == b'\n';
            self.prev_cr = byte == b'\r';
        }
        self.written += input.len() as u64;
    }

    /// Bytes that end the DATA phase given what has been written so far.
    #[must_use]
    pub const fn terminator(&self) -> &'static [u8] {
        if self.at_line_start {
            b".\r\n"
        } else {
            b"\r\n.\r\n"
        }
    }

    /// Number of content bytes accepted, before stuffing.
    #[must_use]
    pub const fn content_len(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stuff_all(chunks: &[&[u8]]) -> (Vec<u8>, DotStuffer) {
        let mut stuffer = DotStuffer::new();
        let mut out = Vec::new();
        for chunk in chunks {
            stuffer.stuff(chunk, &mut out);
        }
        (out, stuffer)
    }

    #[test]
    fn plain_text_untouched() {
        let (out, stuffer) = stuff_all(&[b"Hello\r\nWorld\r\n"]);
        assert_eq!(out, b"Hello\r\nWorld\r\n");
        assert_eq!(stuffer.terminator(), b".\r\n");
        assert_eq!(stuffer.content_len(), 14);
    }

    #[test]
    fn leading_dots_doubled() {
        let (out, _) = stuff_all(&[b".start\r\n..two\r\nmid.dle\r\n.\r\n"]);
        assert_eq!(out, b"..start\r\n...two\r\nmid.dle\r\n..\r\n");
    }

    #[test]
    fn line_boundary_split_across_chunks() {
        let (out, _) = stuff_all(&[b"one\r", b"\n", b".two"]);
        assert_eq!(out, b"one\r\n..two");
    }

    #[test]
    fn bare_line_feeds_are_not_line_breaks() {
        let (out, stuffer) = stuff_all(&[b"unix\n.dot\n.\n"]);
        assert_eq!(out, b"unix\n.dot\n.\n");
        assert_eq!(stuffer.terminator(), b"\r\n.\r\n");
    }

    #[test]
    fn terminator_for_unterminated_and_empty_content() {
        let (_, stuffer) = stuff_all(&[b"no newline"]);
        assert_eq!(stuffer.terminator(), b"\r\n.\r\n");

        let (out, stuffer) = stuff_all(&[]);
        assert!(out.is_empty());
        assert_eq!(stuffer.terminator(), b".\r\n");
    }
}
