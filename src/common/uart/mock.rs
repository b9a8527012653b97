//! Host-side UART that records what the driver does to it.

use super::*;
use std::sync::Mutex;
use std::time::Duration;
use std::vec::Vec;

struct Regs {
    written: Vec<u8>,
    ier: InterruptEnable,
    lsr: LineStatus,
    /// Writes to turn down even though THRE is set.
    refuse: usize,
    /// Line status reads so far.
    polls: usize,
    /// Hold the next write this long before it lands.
    stall: Option<Duration>,
    stalling: bool,
}

/// Clones share the same registers, like two handles to one peripheral.
#[derive(Clone)]
pub(crate) struct MockUart {
    regs: Arc<Mutex<Regs>>,
}

impl MockUart {
    pub fn new() -> Self {
        Self {
            regs: Arc::new(Mutex::new(Regs {
                written: Vec::new(),
                ier: InterruptEnable::empty(),
                lsr: LineStatus::THRE | LineStatus::TEMT,
                refuse: 0,
                polls: 0,
                stall: None,
                stalling: false,
            })),
        }
    }

    pub fn written(&self) -> Vec<u8> {
        self.regs.lock().unwrap().written.clone()
    }

    pub fn set_line_status(&self, lsr: LineStatus) {
        self.regs.lock().unwrap().lsr = lsr;
    }

    pub fn refuse_writes(&self, n: usize) {
        self.regs.lock().unwrap().refuse = n;
    }

    pub fn polls(&self) -> usize {
        self.regs.lock().unwrap().polls
    }

    pub fn stall_next_write(&self, d: Duration) {
        self.regs.lock().unwrap().stall = Some(d);
    }

    /// A stalled write has started and not landed yet.
    pub fn is_stalling(&self) -> bool {
        self.regs.lock().unwrap().stalling
    }
}

impl UartPeriph for MockUart {
    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        let stall = {
            let mut regs = self.regs.lock().unwrap();
            if !regs.lsr.contains(LineStatus::THRE) {
                return Err(nb::Error::WouldBlock);
            }
            if regs.refuse > 0 {
                regs.refuse -= 1;
                return Err(nb::Error::WouldBlock);
            }
            let stall = regs.stall.take();
            regs.stalling = stall.is_some();
            stall
        };
        if let Some(d) = stall {
            std::thread::sleep(d);
        }
        let mut regs = self.regs.lock().unwrap();
        regs.written.push(word);
        regs.stalling = false;
        Ok(())
    }

    fn line_status(&self) -> LineStatus {
        let mut regs = self.regs.lock().unwrap();
        regs.polls += 1;
        regs.lsr
    }

    fn set_interrupt(&mut self, event: UartEvent, enable: bool) {
        self.regs.lock().unwrap().ier.set(event.into(), enable);
    }

    fn is_interrupt_enable(&self, event: UartEvent) -> bool {
        self.regs.lock().unwrap().ier.contains(event.into())
    }
}
