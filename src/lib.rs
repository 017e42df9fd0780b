//! gitkit: git-aware operator utilities.
//!
//! Two independent tools share this library:
//!
//! - `find-base-branch` names the branch the current branch most plausibly
//!   diverged from ([`resolver`]).
//! - `safe-rm` removes files, moving anything git cannot restore into a
//!   backup mirror first ([`remover`]).
//!
//! Both reach git only through [`backend::VcsBackend`].

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs;
pub mod git;
pub mod logging;
pub mod remover;
pub mod resolver;

#[cfg(test)]
mod test_support;
