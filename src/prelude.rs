pub use crate::uart::UartPeriph as _serial_tx_irq_uart_UartPeriph;
pub use embedded_io::Error as _embedded_io_Error;
