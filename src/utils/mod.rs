//! Utility helpers: environment variable access.
pub mod env;

pub use env::EnvReader;
