use crate::config::{DispatchConfig, Mode};
use launchpad::{args, CommandVector, NodeIndex, Topology};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ssh options used for every session: host keys are not checked.
const SSH_OPTIONS: [&str; 2] = ["-o", "StrictHostKeyChecking=no"];

/// A command to be run on the machine of some node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    node: NodeIndex,
    user: String,
    address: String,
    command: Vec<String>,
}

impl RemoteRequest {
    /// Runs `program` followed by the arguments in `command` as `user`.
    pub fn launch(
        user: &str,
        address: &str,
        program: &[String],
        command: CommandVector,
    ) -> Self {
        let node = command.node();
        let mut remote = program.to_vec();
        remote.extend(command.into_args());
        Self {
            node,
            user: user.to_string(),
            address: address.to_string(),
            command: remote,
        }
    }

    /// Kills every process owned by `user`.
    pub fn terminate(node: NodeIndex, user: &str, address: &str) -> Self {
        Self {
            node,
            user: user.to_string(),
            address: address.to_string(),
            command: args!["killall", "-u", user],
        }
    }

    pub fn node(&self) -> NodeIndex {
        self.node
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The command to be run remotely.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// `user@address`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.address)
    }

    /// Arguments to be given to the `ssh` binary.
    pub fn ssh_args(&self) -> Vec<String> {
        let mut ssh_args =
            args![SSH_OPTIONS[0], SSH_OPTIONS[1], self.destination()];
        ssh_args.extend(self.command.iter().cloned());
        ssh_args
    }
}

impl fmt::Display for RemoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ssh {}", self.ssh_args().join(" "))
    }
}

/// Creates one request per machine, in node order. Terminate requests don't
/// need the synthesized commands.
pub fn requests(
    topology: &Topology,
    config: &DispatchConfig,
    mode: Mode,
) -> launchpad::Result<Vec<RemoteRequest>> {
    let machines = topology.machines();
    match mode {
        Mode::Launch => {
            let commands =
                launchpad::synthesize_all(topology, config.peer_format())?;
            Ok(machines
                .iter()
                .zip(commands)
                .map(|(machine, command)| {
                    RemoteRequest::launch(
                        config.user(),
                        machine.address(),
                        config.program(),
                        command,
                    )
                })
                .collect())
        }
        Mode::Terminate => Ok(machines
            .iter()
            .enumerate()
            .map(|(node, machine)| {
                RemoteRequest::terminate(node, config.user(), machine.address())
            })
            .collect()),
    }
}
