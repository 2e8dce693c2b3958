//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes argument parsing, the interactive menu, the manual location
//! prompts and terminal rendering of the dashboard.

mod commands;
pub mod render;

pub use commands::*;
