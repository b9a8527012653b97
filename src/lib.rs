#![no_std]

extern crate alloc;
#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod interrupt;
pub mod prelude;
pub mod uart;

mod common;
mod os;

pub use embedded_io;
pub use nb;

pub(crate) trait Steal {
    /// Steal an instance of this peripheral
    ///
    /// # Safety
    ///
    /// Ensure that the new instance of the peripheral cannot be used in a way
    /// that may race with any existing instances, for example by only
    /// touching the registers that belong to one execution context, or by
    /// using critical sections to coordinate access between multiple
    /// instances.
    unsafe fn steal(&self) -> Self;
}
