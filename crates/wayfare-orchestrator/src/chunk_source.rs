//! Stateful text decoding over a response body.
//!
//! Chunks arrive at arbitrary byte offsets, so a multi-byte character may be
//! split between two of them. [`ChunkSource`] holds the incomplete tail back
//! until the rest arrives and yields only whole text fragments.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use wayfare_abstraction::{ByteStream, TransportError};

use crate::error::StageError;

/// Decoded text fragments of one response body, in arrival order.
///
/// The source is lazy, finite and not restartable. Empty fragments are
/// skipped. After end-of-stream or a read error it is fused and the body
/// handle has already been dropped.
pub struct ChunkSource {
    body: Option<ByteStream>,
    pending: Vec<u8>,
    bytes_read: usize,
}

impl ChunkSource {
    /// Wraps a response body.
    #[must_use]
    pub fn new(body: ByteStream) -> Self {
        Self { body: Some(body), pending: Vec::new(), bytes_read: 0 }
    }

    /// Total bytes pulled from the body so far.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Appends `chunk` to the held-back bytes and decodes as much as possible.
    ///
    /// Invalid sequences become U+FFFD. A trailing incomplete sequence stays
    /// in `pending`.
    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut pos = 0;
        while pos < self.pending.len() {
            match std::str::from_utf8(&self.pending[pos..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    pos = self.pending.len();
                }
                Err(e) => {
                    let valid_end = pos + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[pos..valid_end]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            pos = valid_end + len;
                        }
                        None => {
                            pos = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..pos);
        out
    }

    /// Flushes bytes still held back at end-of-stream.
    fn flush(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    fn release(&mut self) {
        self.body = None;
    }
}

impl Stream for ChunkSource {
    type Item = Result<String, StageError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            let Some(body) = this.body.as_mut() else {
                return Poll::Ready(None);
            };

            match body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.bytes_read += bytes.len();
                    let text = this.decode(&bytes);
                    if text.is_empty() {
                        continue;
                    }
                    return Poll::Ready(Some(Ok(text)));
                }
                Poll::Ready(Some(Err(e))) => {
                    this.release();
                    this.pending.clear();
                    let message = match e {
                        TransportError::Stream(message) => message,
                        other => other.to_string(),
                    };
                    return Poll::Ready(Some(Err(StageError::StreamRead(message))));
                }
                Poll::Ready(None) => {
                    this.release();
                    let tail = this.flush();
                    if tail.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(tail)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::{StreamExt, stream};

    fn body_of(chunks: Vec<Result<Vec<u8>, TransportError>>) -> ByteStream {
        Box::pin(stream::iter(chunks.into_iter().map(|c| c.map(Bytes::from))))
    }

    async fn collect(source: ChunkSource) -> Vec<Result<String, StageError>> {
        source.collect().await
    }

    #[tokio::test]
    async fn test_fragments_in_arrival_order() {
        let source = ChunkSource::new(body_of(vec![Ok(b"Eat ".to_vec()), Ok(b"at ".to_vec())]));
        let out: Vec<String> = collect(source).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["Eat ", "at "]);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        // "é" is 0xC3 0xA9; "🏨" is four bytes.
        let text = "caf\u{e9} \u{1f3e8}";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let source = ChunkSource::new(body_of(vec![
                Ok(bytes[..split].to_vec()),
                Ok(bytes[split..].to_vec()),
            ]));
            let joined: String = collect(source).await.into_iter().map(Result::unwrap).collect();
            assert_eq!(joined, text, "split at byte {split}");
        }
    }

    #[tokio::test]
    async fn test_empty_and_partial_chunks_are_skipped() {
        let euro = "\u{20ac}".as_bytes().to_vec(); // three bytes
        let source = ChunkSource::new(body_of(vec![
            Ok(Vec::new()),
            Ok(euro[..1].to_vec()),
            Ok(euro[1..2].to_vec()),
            Ok(euro[2..].to_vec()),
            Ok(Vec::new()),
            Ok(b"5".to_vec()),
        ]));
        let out: Vec<String> = collect(source).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["\u{20ac}", "5"]);
    }

    #[tokio::test]
    async fn test_invalid_bytes_become_replacement_character() {
        let source = ChunkSource::new(body_of(vec![Ok(vec![b'a', 0xFF, b'b'])]));
        let out: Vec<String> = collect(source).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["a\u{fffd}b"]);
    }

    #[tokio::test]
    async fn test_truncated_character_flushed_at_end() {
        let source = ChunkSource::new(body_of(vec![Ok(b"ok".to_vec()), Ok(vec![0xE2, 0x82])]));
        let out: Vec<String> = collect(source).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out.concat(), "ok\u{fffd}");
    }

    #[tokio::test]
    async fn test_read_error_surfaces_and_fuses() {
        let mut source = ChunkSource::new(body_of(vec![
            Ok(b"partial".to_vec()),
            Err(TransportError::Stream("connection reset".to_string())),
            Ok(b"never".to_vec()),
        ]));

        assert_eq!(source.next().await.unwrap().unwrap(), "partial");
        let err = source.next().await.unwrap().unwrap_err();
        assert_eq!(err, StageError::StreamRead("connection reset".to_string()));
        assert!(source.next().await.is_none());
        assert_eq!(source.bytes_read(), 7);
    }
}
