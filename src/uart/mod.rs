pub mod mmio;

pub use crate::common::uart::*;
pub use mmio::MmioUart;
