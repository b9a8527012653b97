cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "std"))] {
        pub use std::sync::Arc;
        pub use std::boxed::Box;

        #[inline]
        pub fn yield_cpu() {
            std::thread::yield_now();
        }
    } else {
        pub use alloc::boxed::Box;
        pub use alloc::sync::Arc;

        #[inline]
        pub fn yield_cpu() {
            core::hint::spin_loop();
        }
    }
}
