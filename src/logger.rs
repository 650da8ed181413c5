//! `log::Log` implementor: buffers messages until the serial port is ready, then writes
//! every record straight out COM1.
//!
//! Grounded in `logger.rs` `CombinedLogger` state machine, stripped of the
//! `bootloader_x86_64_common::logger::LockedLogger` framebuffer branch and the
//! `ShellFrameBuffer` console (no graphics requirement here).

use crate::serial_println;
use conquer_once::spin::OnceCell;
use core::fmt::{self, Write};
use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Mutex;

const BUFFER_SIZE: usize = 4096;

struct LogBuffer {
    buffer: [u8; BUFFER_SIZE],
    position: usize,
}

impl LogBuffer {
    const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_SIZE],
            position: 0,
        }
    }

    fn contents(&self) -> &str {
        core::str::from_utf8(&self.buffer[..self.position]).unwrap_or("<invalid UTF-8>")
    }
}

impl Write for LogBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = BUFFER_SIZE - self.position;
        if bytes.len() > remaining {
            // Buffer is full; drop the overflow rather than panic during early boot.
            return Ok(());
        }
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }
}

enum LoggerState {
    Buffering,
    SerialReady,
}

pub struct SerialLogger {
    buffer: Mutex<LogBuffer>,
    state: Mutex<LoggerState>,
}

impl SerialLogger {
    const fn new() -> Self {
        SerialLogger {
            buffer: Mutex::new(LogBuffer::new()),
            state: Mutex::new(LoggerState::Buffering),
        }
    }

    /// Call once `serial::init()` has run.
    pub fn serial_ready(&self) {
        let mut state = self.state.lock();
        let buffer = self.buffer.lock();
        if buffer.position > 0 {
            serial_println!("=== buffered boot messages ===");
            serial_println!("{}", buffer.contents());
            serial_println!("=== end buffered messages ===");
        }
        *state = LoggerState::SerialReady;
    }
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let state = match self.state.try_lock() {
            Some(state) => state,
            None => {
                // Don't deadlock if called from an interrupt handler mid-log.
                serial_println!("[irq] {}: {}", record.target(), record.args());
                return;
            }
        };

        match *state {
            LoggerState::Buffering => {
                drop(state);
                if let Some(mut buffer) = self.buffer.try_lock() {
                    let _ = write!(
                        &mut *buffer,
                        "[{:>5}] {}: {}\n",
                        record.level(),
                        record.target(),
                        record.args()
                    );
                }
            }
            LoggerState::SerialReady => {
                drop(state);
                serial_println!("[{:>5}] {}: {}", record.level(), record.target(), record.args());
            }
        }
    }

    fn flush(&self) {}
}

pub static LOGGER: SerialLogger = SerialLogger::new();

static INIT: OnceCell<()> = OnceCell::uninit();

/// Install the global logger. Safe to call before `serial::init()`.
pub fn init_early() {
    INIT.init_once(|| {
        log::set_logger(&LOGGER).expect("logger already set");
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Call after `serial::init()`.
pub fn serial_ready() {
    LOGGER.serial_ready();
}
