//! Filesystem utilities for gitkit.

pub mod atomic;
mod move_file;

pub use atomic::{atomic_write, atomic_write_file};
pub use move_file::move_file;
