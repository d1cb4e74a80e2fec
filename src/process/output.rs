// src/process/output.rs

//! Output destinations for child processes.
//!
//! - [`OutputSink`] is a cloneable, thread-safe byte sink. A child's stdout
//!   and stderr pipes are pumped into sinks by background tasks.
//! - [`PrefixedWriter`] is a stream decorator that inserts a label at the
//!   start of every line, so interleaved output stays attributable.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::debug;

/// Shared byte sink handed to a process at start time.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<Mutex<dyn Write + Send>>,
}

impl OutputSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self::shared(Arc::new(Mutex::new(writer)))
    }

    /// Wrap a writer the caller keeps a handle to (e.g. a capture buffer).
    pub fn shared<W: Write + Send + 'static>(writer: Arc<Mutex<W>>) -> Self {
        let inner: Arc<Mutex<dyn Write + Send>> = writer;
        Self { inner }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// A sink that discards everything.
    pub fn null() -> Self {
        Self::new(io::sink())
    }

    /// Write a whole chunk and flush it.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("output sink lock poisoned"))?;
        writer.write_all(bytes)?;
        writer.flush()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::null()
    }
}

/// Copy everything from `reader` into `sink` until EOF.
///
/// A failing sink does not stop the pump: the pipe keeps being drained so
/// the child never blocks on a full buffer.
pub(crate) fn spawn_pump<R>(
    process: String,
    stream: &'static str,
    mut reader: R,
    sink: OutputSink,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 8 * 1024];
        let mut sink_ok = true;

        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if sink_ok {
                        if let Err(e) = sink.write_all(&buf[..n]) {
                            debug!(
                                process = %process,
                                stream,
                                error = %e,
                                "output sink failed; discarding further output"
                            );
                            sink_ok = false;
                        }
                    }
                }
                Err(e) => {
                    debug!(process = %process, stream, error = %e, "reading child output failed");
                    break;
                }
            }
        }

        debug!(process = %process, stream, "output pump finished");
    })
}

/// Writer that puts `prefix` in front of every line written through it.
///
/// Whether the previous write ended in the middle of a line is remembered,
/// so a line split across several writes still gets exactly one prefix.
#[derive(Debug)]
pub struct PrefixedWriter<W> {
    prefix: String,
    writer: W,
    inline: bool,
}

impl<W: Write> PrefixedWriter<W> {
    pub fn new(writer: W, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            writer,
            inline: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Write for PrefixedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = Vec::with_capacity(buf.len() + self.prefix.len());
        for line in buf.split_inclusive(|b| *b == b'\n') {
            if !self.inline {
                out.extend_from_slice(self.prefix.as_bytes());
            }
            out.extend_from_slice(line);
            self.inline = line.last() != Some(&b'\n');
        }
        self.writer.write_all(&out)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Label used in front of each output line: the name padded to `width`.
pub fn line_label(name: &str, width: usize) -> String {
    format!("{name:<width$} | ")
}
