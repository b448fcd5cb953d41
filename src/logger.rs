// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A minimal [`log`] backend writing `[LEVEL] message` lines.

use std::io::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;
use spin::mutex::SpinMutex;

static STDERR: Once<WriterLogger<io::Stderr>> = Once::new();

/// A logger guarded by a spin mutex so that it may be shared between threads.
#[derive(Debug)]
pub struct WriterLogger<W: Write + Send> {
    writer: SpinMutex<W>,
}

impl<W: Write + Send> WriterLogger<W> {
    /// Creates a logger writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: SpinMutex::new(writer),
        }
    }

    /// Consumes the logger and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Log for WriterLogger<W> {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let writer = &mut *self.writer.lock();
        // Ignore any errors writing, there is nowhere left to report them.
        let _ = writeln!(writer, "[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {
        let _ = self.writer.lock().flush();
    }
}

/// Initialises the logger with the given backend.
///
/// # Errors
///
/// Returns an error if a logger has already been set.
pub fn init(logger: &'static impl Log, max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(max_level);
    Ok(())
}

/// Initialises the logger to write to standard error.
///
/// # Errors
///
/// Returns an error if a logger has already been set.
pub fn init_stderr(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    init(STDERR.call_once(|| WriterLogger::new(io::stderr())), max_level)
}
