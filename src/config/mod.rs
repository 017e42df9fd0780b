//! Configuration model for gitkit.
//!
//! This module defines the Config struct that represents `.gitkit.yaml` at the
//! repository root. The file is optional; every field has a default and unknown
//! fields are ignored.

mod model;
mod operations;


pub use model::Config;

/// Config file name, looked up at the repository root.
pub const CONFIG_FILE_NAME: &str = ".gitkit.yaml";
