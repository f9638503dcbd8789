// file: src/network/mod.rs
// version: 1.0.0
// guid: 2bce7b42-2e8c-4439-802c-34de14ddc732

//! Remote command execution

pub mod executor;
pub mod ssh;

pub use executor::CommandExecutor;
pub use ssh::SshClient;
