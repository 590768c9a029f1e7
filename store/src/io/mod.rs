//! Collaborators with side effects or shared mutable state.

pub mod config;
pub mod init;
pub mod registry;
pub mod results_dir;
pub mod source;
