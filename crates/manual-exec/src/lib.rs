pub mod command;
pub mod config;
pub mod error;
pub mod exec;

pub use error::{ConfigErrors, IntegrityError, ManualExecError, NotFound};
