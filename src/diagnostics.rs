//! Destinations for the benchmark tool's raw output on failure
//!
//! When fio fails, its combined output is the only useful record of what went
//! wrong. The probe hands it to a [`DiagnosticSink`] verbatim, standard output
//! and standard error interleaved in the order they were read; the default
//! sink throws it away.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Receives raw diagnostic output from a failed probe
pub trait DiagnosticSink: Send {
    /// Record the given output
    ///
    /// Errors are reported to the caller but the probe ignores them; losing
    /// diagnostics never changes the outcome of a probe.
    fn write_diagnostics(&mut self, output: &[u8]) -> io::Result<()>;
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl DiagnosticSink for Discard {
    fn write_diagnostics(&mut self, _output: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that forwards output to any [`io::Write`]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> DiagnosticSink for WriterSink<W> {
    fn write_diagnostics(&mut self, output: &[u8]) -> io::Result<()> {
        self.writer.write_all(output)?;
        self.writer.flush()
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

/// Sink that logs each non-empty output line as a warning
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write_diagnostics(&mut self, output: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(output);
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            tracing::warn!(target: "diskprobe::fio", "{}", line);
        }
        Ok(())
    }
}

/// Sink that accumulates output in a shared buffer
///
/// Clones share the same buffer, so a caller can keep one handle and pass
/// another to the probe.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> Vec<u8> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl DiagnosticSink for MemorySink {
    fn write_diagnostics(&mut self, output: &[u8]) -> io::Result<()> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "diagnostic buffer poisoned"))?;
        buffer.extend_from_slice(output);
        Ok(())
    }
}
