//! Utilities shared by the Syncplay binaries: logging setup and clock abstraction.

pub mod logger;
pub mod time;
