//! Output masking for child-process streams.
//!
//! Wraps a byte sink and replaces every exact occurrence of a registered
//! secret value with a fixed placeholder before any byte reaches the sink.
//! Matching is literal byte comparison; no characters are treated as
//! metacharacters. A holdback buffer keeps the tail of each write while it
//! could still be the start of a secret, so values split across chunk
//! boundaries mask identically to single-chunk writes.

use std::io::{self, Write};

/// Replacement emitted for every masked occurrence. Fixed-width, so output
/// never leaks secret lengths.
pub const MASK_PLACEHOLDER: &str = "********";

pub struct OutputMasker<W: Write> {
    inner: W,
    /// Registered secret byte sequences, longest first so overlapping
    /// candidates prefer the longer match.
    secrets: Vec<Vec<u8>>,
    /// Longest registered secret length; 0 when nothing is registered.
    max_len: usize,
    /// Unemitted tail that may still become a match. Bounded by
    /// `max_len - 1` after every write.
    pending: Vec<u8>,
}

impl<W: Write> OutputMasker<W> {
    /// Wrap `inner`, suppressing every value in `values`. Empty values are
    /// dropped, since masking an empty string would corrupt all output.
    pub fn new<I, S>(inner: W, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut secrets: Vec<Vec<u8>> = Vec::new();
        for value in values {
            let bytes = value.as_ref().as_bytes();
            if bytes.is_empty() {
                continue;
            }
            if !secrets.iter().any(|existing| existing.as_slice() == bytes) {
                secrets.push(bytes.to_vec());
            }
        }
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        let max_len = secrets.first().map(Vec::len).unwrap_or(0);
        Self {
            inner,
            secrets,
            max_len,
            pending: Vec::new(),
        }
    }

    /// Emit everything in `pending` that can no longer begin a match,
    /// replacing completed matches as they are found.
    fn drain_ready(&mut self) -> io::Result<()> {
        if self.secrets.is_empty() {
            self.inner.write_all(&self.pending)?;
            self.pending.clear();
            return Ok(());
        }

        let mut out: Vec<u8> = Vec::with_capacity(self.pending.len());
        let mut emitted = 0;
        let mut i = 0;
        while i < self.pending.len() {
            match self
                .secrets
                .iter()
                .find(|secret| self.pending[i..].starts_with(secret.as_slice()))
                .map(Vec::len)
            {
                Some(len) => {
                    out.extend_from_slice(&self.pending[emitted..i]);
                    out.extend_from_slice(MASK_PLACEHOLDER.as_bytes());
                    i += len;
                    emitted = i;
                }
                None => i += 1,
            }
        }

        let tail = &self.pending[emitted..];
        let hold = self.holdback_len(tail);
        out.extend_from_slice(&tail[..tail.len() - hold]);
        let keep = tail[tail.len() - hold..].to_vec();

        self.inner.write_all(&out)?;
        self.pending = keep;
        Ok(())
    }

    /// Length of the longest suffix of `tail` that is a proper prefix of a
    /// registered secret, i.e. the bytes that must not be emitted yet.
    fn holdback_len(&self, tail: &[u8]) -> usize {
        let cap = tail.len().min(self.max_len.saturating_sub(1));
        for k in (1..=cap).rev() {
            let suffix = &tail[tail.len() - k..];
            if self.secrets.iter().any(|secret| secret.starts_with(suffix)) {
                return k;
            }
        }
        0
    }

    /// Release held-back bytes and return the inner writer. A partial prefix
    /// at end-of-stream is not a secret.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(&self.pending)?;
        self.pending.clear();
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for OutputMasker<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_ready()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Held-back bytes stay buffered: they may still be a secret prefix.
        self.inner.flush()
    }
}
