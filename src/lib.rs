//! tsbuild library
//!
//! Core functionality for the tsbuild tool: option normalization, format
//! expansion, bundler configuration assembly, project scaffolding, and lint
//! orchestration.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod lint;
pub mod manifest;
pub mod options;
pub mod pm;
pub mod progress;
pub mod scaffold;

pub use bundler::Bundler;
pub use cli::Cli;
pub use error::Error;
