//! Memory-mapped 16550-compatible UART
//!
//! Register layout of the LPC43xx USART/UART blocks: 32-bit registers, THR at
//! offset 0x00, IER at 0x04 and LSR at 0x14. Clock, pins, baud rate and FIFOs
//! have to be set up before the driver takes over.

use crate::{Steal, common::uart::*};
use core::ptr::{read_volatile, write_volatile};

// register index, in words
const THR: usize = 0;
const IER: usize = 1;
const LSR: usize = 5;

pub struct MmioUart {
    base: *mut u32,
}

// Only the base address is stored.
unsafe impl Send for MmioUart {}

impl MmioUart {
    /// # Safety
    ///
    /// `base` must point to the register block of an enabled and configured
    /// UART, and nothing else may drive its transmitter or its IER.
    pub const unsafe fn new(base: *mut u32) -> Self {
        Self { base }
    }

    /// Take the transmitter, one register handle for each context.
    pub fn into_tx(self) -> Tx<Self> {
        let it = unsafe { self.steal() };
        Tx::new([self, it])
    }

    #[inline(always)]
    fn read_reg(&self, idx: usize) -> u32 {
        unsafe { read_volatile(self.base.add(idx)) }
    }

    #[inline(always)]
    fn write_reg(&mut self, idx: usize, value: u32) {
        unsafe { write_volatile(self.base.add(idx), value) }
    }

    #[inline]
    fn ier(&self) -> InterruptEnable {
        InterruptEnable::from_bits_retain(self.read_reg(IER))
    }
}

impl Steal for MmioUart {
    unsafe fn steal(&self) -> Self {
        Self { base: self.base }
    }
}

impl UartPeriph for MmioUart {
    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        if self.is_tx_empty() {
            self.write_reg(THR, word as u32);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    #[inline]
    fn line_status(&self) -> LineStatus {
        LineStatus::from_bits_truncate(self.read_reg(LSR) as u8)
    }

    fn set_interrupt(&mut self, event: UartEvent, enable: bool) {
        let mut ier = self.ier();
        ier.set(event.into(), enable);
        self.write_reg(IER, ier.bits());
    }

    #[inline]
    fn is_interrupt_enable(&self, event: UartEvent) -> bool {
        self.ier().contains(event.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn peek(base: *mut u32, idx: usize) -> u32 {
        unsafe { read_volatile(base.add(idx)) }
    }

    fn poke(base: *mut u32, idx: usize, value: u32) {
        unsafe { write_volatile(base.add(idx), value) }
    }

    #[test]
    fn register_access() {
        let mut regs = [0u32; 8];
        let base = regs.as_mut_ptr();
        // RBRIE is left alone by the driver
        poke(base, IER, InterruptEnable::RBRIE.bits());
        let mut uart = unsafe { MmioUart::new(base) };

        assert!(!uart.is_tx_empty());
        assert_eq!(uart.write(b'x'), Err(nb::Error::WouldBlock));
        assert_eq!(peek(base, THR), 0);

        poke(base, LSR, (LineStatus::THRE | LineStatus::RDR).bits() as u32);
        assert!(uart.is_tx_empty());
        assert!(!uart.is_tx_complete());
        assert_eq!(uart.write(b'x'), Ok(()));
        assert_eq!(peek(base, THR), b'x' as u32);

        uart.set_interrupt(UartEvent::TxEmpty, true);
        assert_eq!(peek(base, IER), 0b11);
        assert!(uart.is_interrupted(UartEvent::TxEmpty));
        uart.set_interrupt(UartEvent::TxEmpty, false);
        assert_eq!(peek(base, IER), 0b01);
        assert!(!uart.is_interrupted(UartEvent::TxEmpty));
    }

    #[test]
    fn transmit_through_registers() {
        let mut regs = [0u32; 8];
        let base = regs.as_mut_ptr();
        poke(base, LSR, (LineStatus::THRE | LineStatus::TEMT).bits() as u32);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let (mut tx, mut it) = unsafe { MmioUart::new(base) }
            .into_tx()
            .into_interrupt_with(0, move || {
                h.fetch_add(1, Ordering::SeqCst);
            });

        assert!(tx.send_str("ok!"));
        assert_eq!(peek(base, THR), b'o' as u32);
        assert_eq!(peek(base, IER), InterruptEnable::THREIE.bits());

        it.handler();
        assert_eq!(peek(base, THR), b'k' as u32);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        it.handler();
        assert_eq!(peek(base, THR), b'!' as u32);
        assert_eq!(peek(base, IER), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(tx.flush(), Ok(()));
    }
}
