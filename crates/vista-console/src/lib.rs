//! HR analytics console over mocked backends.

pub mod config;
pub use config::{ConfigError, ConsoleConfig};
pub mod console;
pub use console::{Console, Sources};
pub mod error;
pub use error::ConsoleError;
pub mod format;
pub mod mock;
pub mod render;
pub mod sections;
