// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Blocking TCP feed layer.
//!
//! A [`Feed`] owns one stream and a [`LineBuffer`]. Each read appends up to
//! [`READ_CHUNK_SIZE`] bytes; the buffer is only split once it holds a
//! newline, so a start-up burst without line breaks is not rescanned on
//! every read. Reconnecting is left to the caller.

use std::io::{self, ErrorKind, Read};
use std::net::TcpStream;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

/// Largest single read from the socket.
pub const READ_CHUNK_SIZE: usize = 128 * 1024;

/// Errors from the connection itself. All of them end the poll loop.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("feed read failed: {0}")]
    Io(#[from] io::Error),

    #[error("feed closed by peer")]
    Closed,
}

/// Configuration for a feed connection.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Read deadline. A read that hits it returns no lines instead of
    /// blocking forever. Must be non-zero when set.
    pub read_timeout: Option<Duration>,
    /// Bytes to hold without seeing a newline before the buffer is dropped.
    pub max_buffered: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            read_timeout: None,
            max_buffered: 4 * READ_CHUNK_SIZE,
        }
    }
}

/// Accumulates raw bytes and hands back complete lines in order.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
    max_buffered: usize,
}

impl LineBuffer {
    #[must_use]
    pub fn new(max_buffered: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_buffered,
        }
    }

    /// Append a chunk and return every line it completed.
    ///
    /// The trailing fragment after the last newline stays buffered. A
    /// trailing `\r` is stripped from each line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        // The buffer never holds a newline between calls.
        if !chunk.contains(&b'\n') {
            if self.max_buffered > 0 && self.buf.len() > self.max_buffered {
                warn!(
                    "Dropping {} buffered bytes with no line break",
                    self.buf.len()
                );
                self.buf.clear();
            }
            return Vec::new();
        }

        let Some(last) = self.buf.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let rest = self.buf.split_off(last + 1);
        let complete = std::mem::replace(&mut self.buf, rest);

        complete[..last]
            .split(|&b| b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect()
    }

    /// Bytes held back waiting for a newline.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}

/// A line-oriented feed over any byte source, a TCP stream by default.
pub struct Feed<R = TcpStream> {
    reader: R,
    lines: LineBuffer,
    chunk: Vec<u8>,
}

impl<R> std::fmt::Debug for Feed<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("pending", &self.lines.pending().len())
            .finish_non_exhaustive()
    }
}

impl Feed<TcpStream> {
    /// Connect to `host:port`. Resolution failures and refused connections
    /// both surface as [`FeedError::Connect`].
    pub fn connect(host: &str, port: u16, config: &FeedConfig) -> Result<Self, FeedError> {
        let address = format!("{host}:{port}");
        info!("Connecting to {address}...");

        let stream = TcpStream::connect((host, port)).map_err(|source| FeedError::Connect {
            address: address.clone(),
            source,
        })?;
        stream.set_read_timeout(config.read_timeout)?;

        info!("Connected to {address}");
        Ok(Self::from_reader(stream, config))
    }
}

impl<R: Read> Feed<R> {
    /// Wrap an already-open byte source.
    pub fn from_reader(reader: R, config: &FeedConfig) -> Self {
        Self {
            reader,
            lines: LineBuffer::new(config.max_buffered),
            chunk: vec![0; READ_CHUNK_SIZE],
        }
    }

    /// Perform one read and return the lines it completed.
    ///
    /// A read that times out or is interrupted yields no lines. End of
    /// stream is [`FeedError::Closed`].
    pub fn read_lines(&mut self) -> Result<Vec<String>, FeedError> {
        match self.reader.read(&mut self.chunk) {
            Ok(0) => Err(FeedError::Closed),
            Ok(n) => Ok(self.lines.push(&self.chunk[..n])),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(FeedError::Io(e)),
        }
    }

    /// The underlying byte source.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }
}
