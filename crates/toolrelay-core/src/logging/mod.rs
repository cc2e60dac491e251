//! Logging abstractions for runtime-agnostic logging

mod traits;
mod noop;
mod console;

pub use traits::{Logger, LoggerExt, SharedLogger, LogLevel};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
