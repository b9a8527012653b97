//! Sends "Hola " and then "Mundo\r\n", waiting for the completion hook after
//! each one.
//!
//! Runs on the host: a thread plays the UART interrupt, firing once per byte
//! time, and the bytes go to stdout.
//!
//! ```text
//! cargo run --example hola_mundo --features std
//! ```

use serial_tx_irq::{
    interrupt::Callback,
    nb,
    uart::{Infallible, LineStatus, Tx, UartEvent, UartPeriph},
};
use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

static USART2_CB: Callback = Callback::new();

/// Set from the interrupt, cleared by the sending loop.
static TX_COMPLETE: AtomicBool = AtomicBool::new(false);

/// 9600 baud, 10 bits per byte
const BYTE_TIME: Duration = Duration::from_micros(1_042);

#[derive(Clone, Default)]
struct StdoutUart {
    thre_ie: Arc<AtomicBool>,
}

impl UartPeriph for StdoutUart {
    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        let mut out = std::io::stdout();
        out.write_all(&[word]).ok();
        out.flush().ok();
        Ok(())
    }

    fn line_status(&self) -> LineStatus {
        LineStatus::THRE | LineStatus::TEMT
    }

    fn set_interrupt(&mut self, event: UartEvent, enable: bool) {
        match event {
            UartEvent::TxEmpty => self.thre_ie.store(enable, Ordering::SeqCst),
        }
    }

    fn is_interrupt_enable(&self, event: UartEvent) -> bool {
        match event {
            UartEvent::TxEmpty => self.thre_ie.load(Ordering::SeqCst),
        }
    }
}

fn wait_complete() {
    while !TX_COMPLETE.load(Ordering::Acquire) {
        thread::yield_now();
    }
    TX_COMPLETE.store(false, Ordering::Relaxed);
}

fn main() {
    let uart = StdoutUart::default();
    let (mut tx, mut tx_it) = Tx::new([uart.clone(), uart]).into_interrupt_with(10_000, || {
        TX_COMPLETE.store(true, Ordering::Release);
    });
    USART2_CB.set(move || tx_it.handler());

    thread::spawn(|| {
        loop {
            thread::sleep(BYTE_TIME);
            unsafe { USART2_CB.call() };
        }
    });

    for _ in 0..3 {
        if tx.send_str("Hola ") {
            wait_complete();
        }
        if tx.send_str("Mundo\r\n") {
            wait_complete();
        }
        thread::sleep(Duration::from_millis(100));
    }
}
