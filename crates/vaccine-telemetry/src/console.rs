//! `MakeWriter` that forwards formatted lines to the browser console.

use std::io::{self, Write};

use gloo::console;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Produces a [`ConsoleWriter`] per log record.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleMakeWriter;

/// Buffers one formatted record and writes it to the console on flush.
#[derive(Debug)]
pub struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn emit(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buffer).trim_end().to_string();
        self.buffer.clear();
        match self.level {
            Level::ERROR => console::error!(line),
            Level::WARN => console::warn!(line),
            Level::INFO => console::info!(line),
            _ => console::debug!(line),
        }
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        self.emit();
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buffer: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buffer: Vec::new(),
        }
    }
}
