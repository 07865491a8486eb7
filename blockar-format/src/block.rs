//! Fixed-size block I/O over arbitrary byte streams.
//!
//! Both halves count every byte that passes through them. Block boundaries
//! are measured from an origin, which the archive places just after the
//! signature, so that padding can be computed from the running count alone.

use std::io::{ErrorKind, Read, Write};

use crate::error::StreamError;

pub const BLOCK_SIZE: usize = 512;

pub type Block = [u8; BLOCK_SIZE];

pub(crate) const ZERO_BLOCK: Block = [0u8; BLOCK_SIZE];

/// Bytes needed after `len` bytes of content to reach the next block boundary.
#[inline(always)]
pub fn padding_for(len: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - len % block) % block
}

/// A writer wrapper that emits blocks and counts bytes written through it.
#[derive(Debug)]
pub struct BlockWriter<W> {
    inner: W,
    bytes_written: u64,
    origin: u64,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
            origin: 0,
        }
    }

    /// Get the total number of bytes written through this writer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Measure block boundaries from the current position onwards.
    pub(crate) fn set_origin(&mut self) {
        self.origin = self.bytes_written;
    }

    pub fn write_block(&mut self, block: &Block) -> std::io::Result<()> {
        self.write_content(block)
    }

    /// Writes raw bytes without regard for block boundaries; callers finish
    /// with [`BlockWriter::pad`].
    pub fn write_content(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Zero-fills up to the next block boundary and returns the number of
    /// padding bytes written.
    pub fn pad(&mut self) -> std::io::Result<u64> {
        let padding = padding_for(self.bytes_written - self.origin);
        if padding > 0 {
            self.write_content(&ZERO_BLOCK[..padding as usize])?;
        }
        Ok(padding)
    }

    pub fn write_terminator(&mut self) -> std::io::Result<()> {
        self.write_block(&ZERO_BLOCK)?;
        self.write_block(&ZERO_BLOCK)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }

    /// Consume this wrapper and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// A reader wrapper that yields blocks and counts bytes consumed.
#[derive(Debug)]
pub struct BlockReader<R> {
    inner: R,
    bytes_read: u64,
    origin: u64,
}

impl<R: Read> BlockReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
            origin: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub(crate) fn set_origin(&mut self) {
        self.origin = self.bytes_read;
    }

    /// Reads until `buf` is full or the input ends, returning the number of
    /// bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.bytes_read += filled as u64;
        Ok(filled)
    }

    /// Fills `buf` completely, or reports how far it got. `Ok(false)` means
    /// the input ended before the first byte.
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<bool, StreamError> {
        let offset = self.bytes_read;
        match self.fill(buf)? {
            0 if !buf.is_empty() => Ok(false),
            n if n == buf.len() => Ok(true),
            read => Err(StreamError::Truncated {
                offset,
                read,
                expected: buf.len(),
            }),
        }
    }

    /// Reads the next block. `None` means the input ended cleanly on a
    /// block boundary; a partial block is [`StreamError::Truncated`].
    pub fn read_block(&mut self) -> Result<Option<Block>, StreamError> {
        let mut block = ZERO_BLOCK;
        if self.fill_exact(&mut block)? {
            tracing::trace!(offset = self.bytes_read - BLOCK_SIZE as u64, "read block");
            Ok(Some(block))
        } else {
            Ok(None)
        }
    }

    /// Reads the leading signature. An empty input yields an empty vector,
    /// a short one whatever bytes were present.
    pub(crate) fn read_signature(&mut self, len: usize) -> Result<Vec<u8>, StreamError> {
        let mut buf = vec![0u8; len];
        let read = self.fill(&mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    /// A single read of at most `buf.len()` bytes. Zero means end of input.
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => {
                    self.bytes_read += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Skips forward to the next block boundary, returning the number of
    /// bytes skipped.
    pub fn align(&mut self) -> Result<u64, StreamError> {
        let padding = padding_for(self.bytes_read - self.origin) as usize;
        if padding > 0 {
            let mut scratch = [0u8; BLOCK_SIZE];
            let offset = self.bytes_read;
            let read = self.fill(&mut scratch[..padding])?;
            if read != padding {
                return Err(StreamError::Truncated {
                    offset,
                    read,
                    expected: padding,
                });
            }
        }
        Ok(padding as u64)
    }
}
