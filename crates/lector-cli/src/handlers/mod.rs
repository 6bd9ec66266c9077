//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(...) -> Result<(), CliError>`
//! - Thin wrappers that:
//!   1. Read and validate CLI-specific input
//!   2. Call into `lector-voice` through the bootstrap helpers
//!   3. Format output for the terminal

pub mod segment;
pub mod speak;
pub mod translate;
