//! Line framing for the IRC stream.
//!
//! Works on raw bytes rather than `str`: a line that is not valid UTF-8 is
//! decoded lossily and a line longer than the limit is dropped, so neither
//! ends the stream. Only socket I/O errors surface as `Err`.

use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::utils::error::IrcError;

#[derive(Debug, Clone)]
pub struct IrcLineCodec {
    max_length: usize,
    /// Bytes of the buffer already searched for a newline.
    next_index: usize,
    /// Skipping the rest of an oversized line.
    discarding: bool,
}

impl IrcLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

impl Decoder for IrcLineCodec {
    type Item = String;
    type Error = IrcError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, IrcError> {
        loop {
            let read_to = buf.len().min(self.max_length.saturating_add(1));
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| offset + self.next_index);

            match (self.discarding, newline) {
                (true, Some(end)) => {
                    buf.advance(end + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(end)) => {
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    return Ok(Some(decode_line(&line[..end])));
                }
                (false, None) if buf.len() > self.max_length => {
                    warn!("Discarding line longer than {} bytes", self.max_length);
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, IrcError> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if self.discarding || buf.is_empty() {
            self.discarding = false;
            buf.clear();
            return Ok(None);
        }
        let line = buf.split();
        Ok(Some(decode_line(&line)))
    }
}

impl Encoder<String> for IrcLineCodec {
    type Error = IrcError;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), IrcError> {
        buf.reserve(line.len() + 2);
        buf.put_slice(line.as_bytes());
        buf.put_slice(b"\r\n");
        Ok(())
    }
}
