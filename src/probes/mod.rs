//! Generic probes that need no driver.

pub mod tcp;

pub use tcp::{dial, tcp_checker};
