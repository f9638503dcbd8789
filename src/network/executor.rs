// file: src/network/executor.rs
// version: 1.0.0
// guid: 92286d5a-de08-40bb-b042-5b6b000c8ec1

//! Command execution trait for remote hosts

use crate::Result;

/// Trait for running commands on a remote host
#[async_trait::async_trait]
pub trait CommandExecutor: Send {
    /// Connect to target with password authentication
    async fn connect(&mut self, host: &str, port: u16, username: &str, password: &str) -> Result<()>;

    /// Execute command, returning exit status, stdout and stderr
    async fn execute_with_error_collection(
        &mut self,
        command: &str,
        description: &str,
    ) -> Result<(i32, String, String)>;

    /// Disconnect
    fn disconnect(&mut self);
}

#[async_trait::async_trait]
impl CommandExecutor for crate::network::SshClient {
    async fn connect(&mut self, host: &str, port: u16, username: &str, password: &str) -> Result<()> {
        self.connect(host, port, username, password).await
    }

    async fn execute_with_error_collection(
        &mut self,
        command: &str,
        description: &str,
    ) -> Result<(i32, String, String)> {
        self.execute_with_error_collection(command, description)
            .await
    }

    fn disconnect(&mut self) {
        self.disconnect()
    }
}
