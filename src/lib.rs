//! init-keyboard library
//!
//! Builds and runs the `setxkbmap`/`xset` requests that configure a newly
//! attached keyboard. Exposed as a library so the binary stays thin and the
//! request logic can be tested without an X session.

pub mod config;
pub mod error;
pub mod keyboard;
pub mod lock;
pub mod runner;

pub use config::Config;
pub use error::{InitError, RunError};
pub use keyboard::{initialize, layout_request, repeat_request, KeyboardArgs};
pub use runner::{CommandRunner, DryRunner, SystemRunner, ToolInvocation};
