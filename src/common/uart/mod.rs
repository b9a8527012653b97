use crate::os::Arc;
use embedded_io as e_io;

mod uart_it;
#[cfg(test)]
pub(crate) mod mock;

pub use core::convert::Infallible;
pub use uart_it::*;

/// UART Transmitter
pub struct Tx<U> {
    uart: [U; 2],
}

impl<U: UartPeriph> Tx<U> {
    /// Both handles must refer to the same peripheral. The first one is kept
    /// by the task side, the second one by the interrupt handler.
    pub fn new(uart: [U; 2]) -> Self {
        Self { uart }
    }

    /// Split into the task half and the interrupt half. The completion hook
    /// does nothing.
    pub fn into_interrupt(
        self,
        flush_retry_times: u32,
    ) -> (UartInterruptTx<U>, UartInterruptTxHandler<U, fn()>) {
        self.into_interrupt_with(flush_retry_times, noop as fn())
    }

    /// Split into the task half and the interrupt half. `on_complete` runs in
    /// interrupt context each time a multi-byte transmission ends.
    pub fn into_interrupt_with<C: FnMut()>(
        self,
        flush_retry_times: u32,
        on_complete: C,
    ) -> (UartInterruptTx<U>, UartInterruptTxHandler<U, C>) {
        let [mut u1, u2] = self.uart;
        u1.set_interrupt(UartEvent::TxEmpty, false);
        let state = Arc::new(TransmitState::new());
        (
            UartInterruptTx::new(u1, state.clone(), flush_retry_times),
            UartInterruptTxHandler::new(u2, state, on_complete),
        )
    }
}

fn noop() {}

// ----------------------------------------------------------------------------

pub trait UartPeriph {
    /// Write to the transmit holding register if it is empty.
    fn write(&mut self, word: u8) -> nb::Result<(), Infallible>;
    fn line_status(&self) -> LineStatus;

    fn set_interrupt(&mut self, event: UartEvent, enable: bool);
    fn is_interrupt_enable(&self, event: UartEvent) -> bool;

    #[inline]
    fn is_tx_empty(&self) -> bool {
        self.line_status().contains(LineStatus::THRE)
    }

    #[inline]
    fn is_tx_complete(&self) -> bool {
        self.line_status().contains(LineStatus::TEMT)
    }

    /// The interrupt source is armed and its condition is present.
    fn is_interrupted(&self, event: UartEvent) -> bool {
        self.is_interrupt_enable(event)
            && match event {
                UartEvent::TxEmpty => self.is_tx_empty(),
            }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartEvent {
    /// New data can be sent
    TxEmpty,
}

bitflags::bitflags! {
    /// Line status register
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LineStatus: u8 {
        /// Receiver data ready
        const RDR = 1 << 0;
        /// Overrun error
        const OE = 1 << 1;
        /// Parity error
        const PE = 1 << 2;
        /// Framing error
        const FE = 1 << 3;
        /// Break interrupt
        const BI = 1 << 4;
        /// Transmit holding register empty
        const THRE = 1 << 5;
        /// Transmitter empty, the shift register is idle too
        const TEMT = 1 << 6;
        /// Error in receiver FIFO
        const RXFE = 1 << 7;
    }
}

bitflags::bitflags! {
    /// Interrupt enable register
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InterruptEnable: u32 {
        /// Receive data available
        const RBRIE = 1 << 0;
        /// Transmit holding register empty
        const THREIE = 1 << 1;
        /// Receive line status
        const RLSIE = 1 << 2;
    }
}

impl From<UartEvent> for InterruptEnable {
    #[inline]
    fn from(event: UartEvent) -> Self {
        match event {
            UartEvent::TxEmpty => InterruptEnable::THREIE,
        }
    }
}

/// UART error
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A transmission is still in flight.
    Busy,
    /// The transmission did not drain within the retry budget.
    Timeout,
}

impl e_io::Error for Error {
    #[inline]
    fn kind(&self) -> e_io::ErrorKind {
        match self {
            Error::Busy => e_io::ErrorKind::Interrupted,
            Error::Timeout => e_io::ErrorKind::TimedOut,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Busy => f.write_str("transmission in progress"),
            Error::Timeout => f.write_str("transmission did not complete in time"),
        }
    }
}

impl core::error::Error for Error {}
