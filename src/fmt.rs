//! Diagnostic output.
//!
//! Every macro takes the runtime `diagnostics` flag as its first argument and
//! forwards to whichever backend feature is enabled: `log`, `defmt` or
//! `esp32-log` (`esp-println`). Without a backend the macros only evaluate the
//! flag, so arguments never trigger unused warnings and nothing is linked in.
#![macro_use]
#![allow(unused_macros)]

macro_rules! diag {
    ($level:ident, $enabled:expr, $s:literal $(, $x:expr)* $(,)?) => {
        if $enabled {
            #[cfg(feature = "log")]
            ::log::$level!($s $(, $x)*);
            #[cfg(feature = "defmt")]
            ::defmt::$level!($s $(, $x)*);
            #[cfg(feature = "esp32-log")]
            ::esp_println::println!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt", feature = "esp32-log")))]
            let _ = ($(&$x,)*);
        }
    };
}

macro_rules! info {
    ($enabled:expr, $($arg:tt)*) => {
        diag!(info, $enabled, $($arg)*)
    };
}

macro_rules! warn {
    ($enabled:expr, $($arg:tt)*) => {
        diag!(warn, $enabled, $($arg)*)
    };
}

macro_rules! error {
    ($enabled:expr, $($arg:tt)*) => {
        diag!(error, $enabled, $($arg)*)
    };
}
