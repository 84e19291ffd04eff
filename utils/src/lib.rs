#[cfg(feature = "logger")]
pub mod logger;

#[cfg(feature = "codec")]
pub mod macros;

pub mod process;
