// file: src/network/ssh.rs
// version: 1.0.0
// guid: 9a4c55b8-71c1-424c-9a92-953827972359

//! SSH client for running inventory commands on ESXi hosts

use crate::error::ResolverError;
use crate::Result;
use ssh2::Session;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, error, info};

/// SSH client for remote operations
pub struct SshClient {
    session: Option<Session>,
    host: String,
    connect_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl SshClient {
    /// Create a new SSH client that blocks until the transport gives up
    pub fn new() -> Self {
        Self {
            session: None,
            host: String::new(),
            connect_timeout: None,
            command_timeout: None,
        }
    }

    /// Create a new SSH client with optional connect and command timeouts
    pub fn with_timeouts(connect_timeout: Option<Duration>, command_timeout: Option<Duration>) -> Self {
        Self {
            session: None,
            host: String::new(),
            connect_timeout,
            command_timeout,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn open_tcp(&self, host: &str, port: u16) -> Result<TcpStream> {
        let unreachable =
            |e: std::io::Error| ResolverError::unreachable(format!("Failed to connect to {}: {}", host, e));

        match self.connect_timeout {
            None => TcpStream::connect((host, port)).map_err(unreachable),
            Some(timeout) => {
                let mut last_error = None;
                for addr in (host, port).to_socket_addrs().map_err(unreachable)? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(stream) => return Ok(stream),
                        Err(e) => last_error = Some(e),
                    }
                }
                Err(unreachable(last_error.unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
                })))
            }
        }
    }

    /// Connect to remote host via SSH with password authentication
    pub async fn connect(&mut self, host: &str, port: u16, username: &str, password: &str) -> Result<()> {
        info!("Connecting to {}:{} as {}", host, port, username);

        let tcp = self.open_tcp(host, port)?;

        let mut session = Session::new()
            .map_err(|e| ResolverError::ssh(format!("Failed to create SSH session: {}", e)))?;

        if let Some(timeout) = self.command_timeout {
            session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        }

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ResolverError::unreachable(format!("SSH handshake failed: {}", e)))?;

        session.userauth_password(username, password).map_err(|e| {
            ResolverError::auth(format!("SSH authentication failed for {}: {}", username, e))
        })?;

        if !session.authenticated() {
            return Err(ResolverError::auth("SSH authentication failed"));
        }

        self.session = Some(session);
        self.host = host.to_string();

        debug!("SSH connection to the host {} is successful", host);
        Ok(())
    }

    /// Execute a command and collect its exit status, stdout and stderr.
    ///
    /// A non-zero exit status is logged but not treated as a failure; only
    /// transport problems are returned as errors.
    pub async fn execute_with_error_collection(
        &mut self,
        command: &str,
        description: &str,
    ) -> Result<(i32, String, String)> {
        debug!("Executing: {} -> {}", description, command);

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ResolverError::no_session("No active SSH session"))?;

        let mut channel = session
            .channel_session()
            .map_err(|e| ResolverError::ssh(format!("Failed to create SSH channel: {}", e)))?;

        channel
            .exec(command)
            .map_err(|e| ResolverError::ssh(format!("Failed to execute command: {}", e)))?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        channel
            .read_to_string(&mut stdout)
            .map_err(|e| ResolverError::ssh(format!("Failed to read stdout: {}", e)))?;

        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| ResolverError::ssh(format!("Failed to read stderr: {}", e)))?;

        channel
            .wait_close()
            .map_err(|e| ResolverError::ssh(format!("Failed to close SSH channel: {}", e)))?;

        let exit_status = channel
            .exit_status()
            .map_err(|e| ResolverError::ssh(format!("Failed to get exit status: {}", e)))?;

        if !stderr.trim().is_empty() {
            error!("Command '{}' on {} wrote to stderr: {}", description, self.host, stderr);
        } else {
            debug!(
                "Command '{}' exited with {} ({} bytes)",
                description,
                exit_status,
                stdout.len()
            );
        }

        Ok((exit_status, stdout, stderr))
    }

    /// Disconnect SSH session
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.disconnect(None, "", None);
            debug!("SSH session to {} disconnected", self.host);
        }
    }
}

impl Drop for SshClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Default for SshClient {
    fn default() -> Self {
        Self::new()
    }
}
