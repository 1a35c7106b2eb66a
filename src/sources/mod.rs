//! Configuration sources: the environment, the file, and its format.

mod env;
mod file;
mod format;

pub use env::EnvSource;
pub use file::FileSource;
pub use format::{Format, decode_extension};
