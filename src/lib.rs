//! Load typed `KEY=VALUE` files into the process environment.
//!
//! [`EnvLoader::load`] is the safe default: values land in an in-process
//! [`EnvStore`] and are propagated to an in-memory [`TargetEnv`] unless a
//! different sink is configured.
//!
//! Convenience loaders (`load`, `dotenv`, `from_path`, `from_paths`) write
//! through to the process environment and are `unsafe`, because callers must
//! guarantee no concurrent process-environment access.

mod env;
mod error;
mod loader;
mod model;
mod parser;

pub use env::{EnvironmentSink, TargetEnv};
pub use error::{Error, RowError, RowErrorKind};
pub use loader::{EnvLoader, LoadOptions, dotenv, from_path, from_paths, load};
pub use model::{EnvStore, Entry, LoadReport, LoaderConfig, Value};
pub use parser::{parse_reader, parse_str, parse_value};
