//! UART interrupt-driven transmission
//!
//! The task half writes the first byte itself and arms the "transmit holding
//! register empty" interrupt. The interrupt half writes one byte per firing
//! and disarms the source after the last one. The buffer is never copied,
//! which is why it must be `'static`.

use super::*;
use crate::os;
use core::cell::Cell;
use core::ffi::CStr;
use core::sync::atomic::{AtomicBool, Ordering};
use critical_section::Mutex;
use embedded_io::{ErrorType, WriteReady};

#[derive(Clone, Copy)]
struct Cursor {
    data: &'static [u8],
    length: usize,
    sent: usize,
}

impl Cursor {
    const IDLE: Self = Self {
        data: &[],
        length: 0,
        sent: 0,
    };
}

/// State of the transmission in flight, shared by both halves.
pub(crate) struct TransmitState {
    cursor: Mutex<Cell<Cursor>>,
    /// Set by the interrupt half, consumed by the task half.
    complete: AtomicBool,
}

impl TransmitState {
    pub(super) const fn new() -> Self {
        Self {
            cursor: Mutex::new(Cell::new(Cursor::IDLE)),
            complete: AtomicBool::new(false),
        }
    }

    #[inline]
    fn cursor(&self) -> Cursor {
        critical_section::with(|cs| self.cursor.borrow(cs).get())
    }

}

// TX -------------------------------------------------------------------------

pub struct UartInterruptTx<U> {
    uart: U,
    state: Arc<TransmitState>,
    flush_retry_times: u32,
}

impl<U: UartPeriph> UartInterruptTx<U> {
    pub(super) fn new(uart: U, state: Arc<TransmitState>, flush_retry_times: u32) -> Self {
        Self {
            uart,
            state,
            flush_retry_times,
        }
    }

    /// Start sending `data`.
    ///
    /// The first byte is written before returning. Returns `true` if more
    /// bytes are left for the interrupt handler, in which case the completion
    /// hook runs once they are out. Returns `false` for empty and one-byte
    /// buffers, and the hook is not called for those.
    ///
    /// Must not be called while a transmission is in flight. If it is, the
    /// old transmission is abandoned; use [`Self::try_start`] to get an error
    /// instead.
    pub fn start(&mut self, data: &'static [u8]) -> bool {
        let prev = self.state.cursor();
        if prev.sent < prev.length {
            log::warn!(
                "uart tx: start with {} bytes still pending, dropping them",
                prev.length - prev.sent
            );
            self.uart.set_interrupt(UartEvent::TxEmpty, false);
        }
        self.state.complete.store(false, Ordering::Relaxed);

        let length = data.len();
        let uart = &mut self.uart;
        // A handler already past its THRE check waits here, then continues
        // with the new buffer.
        critical_section::with(|cs| {
            let sent = if length > 0 {
                nb::block!(uart.write(data[0])).ok();
                1
            } else {
                0
            };
            self.state
                .cursor
                .borrow(cs)
                .set(Cursor { data, length, sent });
        });
        if length == 0 {
            return false;
        }

        let pending = length > 1;
        if pending {
            self.uart.set_interrupt(UartEvent::TxEmpty, true);
        }
        log::trace!("uart tx: start {} bytes, pending {}", length, pending);
        pending
    }

    /// Like [`Self::start`], but refuses to touch a transmission in flight.
    pub fn try_start(&mut self, data: &'static [u8]) -> Result<bool, Error> {
        if !self.is_idle() {
            return Err(Error::Busy);
        }
        Ok(self.start(data))
    }

    #[inline]
    pub fn send_str(&mut self, s: &'static str) -> bool {
        self.start(s.as_bytes())
    }

    /// The terminating NUL is not sent.
    #[inline]
    pub fn send_cstr(&mut self, s: &'static CStr) -> bool {
        self.start(s.to_bytes())
    }

    /// Every byte of the last buffer has been handed to the hardware.
    #[inline]
    pub fn is_idle(&self) -> bool {
        let c = self.state.cursor();
        c.sent == c.length
    }

    /// Bytes handed to the hardware so far and the length of the buffer.
    pub fn progress(&self) -> (usize, usize) {
        let c = self.state.cursor();
        (c.sent, c.length)
    }

    /// Returns `true` once after the interrupt handler finished a
    /// transmission.
    pub fn take_complete(&mut self) -> bool {
        // single consumer, so load + store is enough
        if self.state.complete.load(Ordering::Acquire) {
            self.state.complete.store(false, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Wait until the whole buffer has left the transmitter.
    ///
    /// Gives up after `flush_retry_times` polls without a byte going out.
    pub fn flush(&mut self) -> Result<(), Error> {
        let mut retry = 0;
        let mut last = self.progress().0;
        loop {
            if self.uart.is_tx_complete() && self.is_idle() {
                return Ok(());
            }

            let (sent, length) = self.progress();
            if sent != last {
                last = sent;
                retry = 0;
            } else {
                // unchanged
                retry += 1;
                if retry > self.flush_retry_times {
                    log::warn!("uart tx: flush timeout, {}/{} bytes sent", sent, length);
                    return Err(Error::Timeout);
                }
            }
            os::yield_cpu();
        }
    }
}

impl<U: UartPeriph> ErrorType for UartInterruptTx<U> {
    type Error = Error;
}

impl<U: UartPeriph> WriteReady for UartInterruptTx<U> {
    /// A new buffer can be started without dropping the current one.
    #[inline]
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_idle())
    }
}

// TX interrupt -----------------

pub struct UartInterruptTxHandler<U, C> {
    uart: U,
    state: Arc<TransmitState>,
    on_complete: C,
}

impl<U, C> UartInterruptTxHandler<U, C>
where
    U: UartPeriph,
    C: FnMut(),
{
    pub(super) fn new(uart: U, state: Arc<TransmitState>, on_complete: C) -> Self {
        Self {
            uart,
            state,
            on_complete,
        }
    }

    /// Call it from the UART interrupt.
    pub fn handler(&mut self) {
        if !self.uart.is_interrupted(UartEvent::TxEmpty) {
            return;
        }

        let uart = &mut self.uart;
        let finished = critical_section::with(|cs| {
            let cell = self.state.cursor.borrow(cs);
            let mut c = cell.get();
            if c.sent >= c.length {
                // armed with nothing to send
                uart.set_interrupt(UartEvent::TxEmpty, false);
                return false;
            }
            if uart.write(c.data[c.sent]).is_err() {
                // retried on the next firing
                return false;
            }
            c.sent += 1;
            cell.set(c);
            if c.sent < c.length {
                return false;
            }
            uart.set_interrupt(UartEvent::TxEmpty, false);
            self.state.complete.store(true, Ordering::Release);
            true
        });

        if finished {
            (self.on_complete)();
        }
    }
}
