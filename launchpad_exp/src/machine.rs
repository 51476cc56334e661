use crate::request::RemoteRequest;
use async_trait::async_trait;
use color_eyre::eyre::{self, WrapErr};
use color_eyre::Report;

const DEFAULT_SSH_BINARY: &str = "ssh";

/// Something able to run a command on a remote machine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Runs `request` and waits for it to exit. A non-zero exit is an error.
    async fn exec(&self, request: &RemoteRequest) -> Result<(), Report>;
}

/// Runs requests with the local `ssh` binary.
#[derive(Debug, Clone)]
pub struct Ssh {
    binary: String,
}

impl Ssh {
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_SSH_BINARY)
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn prepare_exec(
        &self,
        request: &RemoteRequest,
    ) -> tokio::process::Command {
        tracing::debug!("{}", request);
        let mut command = tokio::process::Command::new(&self.binary);
        command.args(request.ssh_args());
        command
    }
}

impl Default for Ssh {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for Ssh {
    async fn exec(&self, request: &RemoteRequest) -> Result<(), Report> {
        let status = self
            .prepare_exec(request)
            .status()
            .await
            .wrap_err_with(|| {
                format!("{} session to {}", self.binary, request.destination())
            })?;
        if !status.success() {
            eyre::bail!("{} exited with {}", request.destination(), status);
        }
        Ok(())
    }
}

/// Prints requests instead of running them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

#[async_trait]
impl Transport for DryRun {
    async fn exec(&self, request: &RemoteRequest) -> Result<(), Report> {
        println!("{}", request);
        Ok(())
    }
}
