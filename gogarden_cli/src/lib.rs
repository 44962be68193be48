//! GoGarden CLI library
//!
//! Configuration, paths and command implementations behind the `gogarden`
//! binary, exposed so they can be tested without spawning processes.

pub mod commands;
pub mod config;
pub mod output;
pub mod paths;
pub mod terminal;
