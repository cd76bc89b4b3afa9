pub mod config;
pub mod error;
pub mod types;

pub use config::PizzeriaConfig;
pub use error::{ErrorKind, PizzeriaError, Result};
pub use types::*;
