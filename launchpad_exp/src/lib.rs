#![deny(rust_2018_idioms)]

#[cfg(feature = "exp")]
pub mod dispatch;
#[cfg(feature = "exp")]
pub mod machine;
#[cfg(feature = "exp")]
pub mod progress;

pub mod config;
pub mod request;

// Re-exports.
pub use config::{DispatchConfig, FailurePolicy, Mode, WaitPolicy};
pub use request::RemoteRequest;

/// Exit code for a dispatch pass that stopped at a failed node.
pub const EXIT_DISPATCH: i32 = 3;
