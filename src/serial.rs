//! COM1 serial port driver.
//!
//! 16550 UART port I/O is identical on 32-bit and 64-bit x86, so this module is kept
//! close to a simple UART driver, trimmed of the serial-input queue/waker machinery (no
//! interactive console in this spec) and re-typed onto the `x86` crate's interrupt
//! helpers in place of `x86_64::instructions::interrupts`.

use core::fmt;
use spin::Mutex;
use uart_16550::SerialPort;
use x86::flags::{self, Flags};

const COM1_PORT: u16 = 0x3F8;

pub static SERIAL1: Mutex<SerialPort> = Mutex::new(unsafe { SerialPort::new(COM1_PORT) });

pub fn init() {
    SERIAL1.lock().init();
}

fn without_interrupts<F: FnOnce() -> R, R>(f: F) -> R {
    let were_enabled = flags::read().contains(Flags::FLAGS_IF);
    if were_enabled {
        unsafe { x86::irq::disable() };
    }
    let result = f();
    if were_enabled {
        unsafe { x86::irq::enable() };
    }
    result
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;

    without_interrupts(|| {
        SERIAL1
            .lock()
            .write_fmt(args)
            .expect("printing to serial failed");
    });
}

/// Try to print without blocking; returns `Err` if the port lock is already held.
pub fn try_print(args: fmt::Arguments) -> Result<(), ()> {
    use core::fmt::Write;

    without_interrupts(|| match SERIAL1.try_lock() {
        Some(mut serial) => serial.write_fmt(args).map_err(|_| ()),
        None => Err(()),
    })
}

#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => ($crate::serial::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)));
}
