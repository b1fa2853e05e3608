//! The three I/O pumps of a running child
//!
//! Each pump runs on its own thread for the lifetime of the child:
//! - the feeder writes the whole input to stdin, then closes it;
//! - two readers drain stdout and stderr in small chunks into buffers bounded
//!   by the stream's cap, requesting a kill when the cap would be exceeded.
//!
//! Readers must drain concurrently with the wait for exit, otherwise a child
//! filling the OS pipe buffer blocks forever.

use std::io::{self, Read, Write};
use std::process::ChildStdin;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::error::{ExecError, IoError};
use crate::killer::{KillReason, Killer};

/// Bytes requested from a pipe per read
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Upper bound on the capture buffer allocated before any output arrives
pub const PREALLOC_LIMIT: usize = 64 * 1024;

/// A captured output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }

    pub fn overflow_reason(self) -> KillReason {
        match self {
            Stream::Stdout => KillReason::StdoutOverflow,
            Stream::Stderr => KillReason::StderrOverflow,
        }
    }
}

/// Why a bounded read stopped early
#[derive(Debug)]
pub enum CaptureError {
    /// The next chunk would have exceeded the cap; output is truncated to it
    Overflow,
    Read(io::Error),
}

/// Output of one reader
#[derive(Debug)]
pub struct Capture {
    pub bytes: Vec<u8>,
    pub error: Option<CaptureError>,
}

/// Write all of `input`, then close the writer by dropping it
pub fn feed<W: Write>(mut writer: W, input: &[u8]) -> io::Result<()> {
    writer.write_all(input)?;
    writer.flush()
}

/// Read `reader` to its end, keeping at most `cap` bytes
pub fn read_bounded<R: Read>(mut reader: R, cap: usize, chunk_size: usize) -> Capture {
    // Grows past the preallocation on demand; the cap check bounds it.
    let mut bytes = Vec::with_capacity(cap.min(PREALLOC_LIMIT));
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if bytes.len() + n > cap {
                    let room = cap - bytes.len();
                    bytes.extend_from_slice(&chunk[..room]);
                    return Capture {
                        bytes,
                        error: Some(CaptureError::Overflow),
                    };
                }
                bytes.extend_from_slice(&chunk[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_stream_end(&e) => break,
            Err(e) => {
                warn!(error = %e, "unexpected error reading from pipe");
                return Capture {
                    bytes,
                    error: Some(CaptureError::Read(e)),
                };
            }
        }
    }

    Capture { bytes, error: None }
}

/// Closed-pipe conditions that mean "no more data", not failure
fn is_stream_end(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
    )
}

/// Captured bytes of one stream plus the error that stopped it, if any
#[derive(Debug, Default)]
pub struct StreamOutput {
    pub bytes: Vec<u8>,
    pub error: Option<ExecError>,
}

pub fn spawn_feeder(
    stdin: ChildStdin,
    input: Vec<u8>,
) -> io::Result<JoinHandle<Option<ExecError>>> {
    thread::Builder::new()
        .name("execguard-stdin".to_string())
        .spawn(move || match feed(stdin, &input) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, input_len = input.len(), "feeding stdin failed");
                Some(IoError::new("Writing stdin failed", e).into())
            }
        })
}

/// Start the reader for `stream`; an overflow requests a kill through `killer`
pub fn spawn_reader<R>(
    stream: Stream,
    reader: R,
    cap: usize,
    chunk_size: usize,
    killer: Arc<Killer>,
) -> io::Result<JoinHandle<StreamOutput>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("execguard-{}", stream.name()))
        .spawn(move || {
            let capture = read_bounded(reader, cap, chunk_size);
            let error = match capture.error {
                None => None,
                Some(CaptureError::Overflow) => {
                    let reason = stream.overflow_reason();
                    killer.kill(reason);
                    Some(reason.to_error())
                }
                Some(CaptureError::Read(e)) => Some(
                    IoError::new(format!("Reading {} failed", stream.name()), e).into(),
                ),
            };
            StreamOutput {
                bytes: capture.bytes,
                error,
            }
        })
}
