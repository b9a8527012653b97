//! Dispatch from an interrupt vector to a handler registered at runtime.
//!
//! ```ignore
//! static USART2_CB: Callback = Callback::new();
//!
//! #[interrupt]
//! fn USART2() {
//!     unsafe { USART2_CB.call() }
//! }
//!
//! let (tx, mut tx_it) = uart.into_tx().into_interrupt(10_000);
//! USART2_CB.set(move || tx_it.handler());
//! ```

use crate::os::Box;
use core::cell::{Cell, OnceCell};

pub struct Callback {
    callback: OnceCell<Cell<Box<dyn FnMut()>>>,
}

unsafe impl Sync for Callback {}

/// # Safety
///
/// Sharing it across multiple interrupt callbacks may lead to a data race.
impl Callback {
    pub const fn new() -> Self {
        Self {
            callback: OnceCell::new(),
        }
    }

    /// Register the callback. You can call it only once.
    ///
    /// Enable the interrupt line after this, not before.
    pub fn set(&self, callback: impl FnMut() + 'static) {
        let cb = Cell::new(Box::new(callback) as Box<dyn FnMut()>);
        critical_section::with(|_| {
            assert!(self.callback.set(cb).is_ok(), "callback already set");
        });
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.callback.get().is_some()
    }

    /// # Safety
    ///
    /// Call it from one interrupt vector only.
    pub unsafe fn call(&self) {
        if let Some(cb) = self.callback.get() {
            unsafe { (*cb.as_ptr())() }
        }
    }
}

impl Default for Callback {
    fn default() -> Self {
        Self::new()
    }
}
