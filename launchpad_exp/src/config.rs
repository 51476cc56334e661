use launchpad::PeerFormat;
use serde::{Deserialize, Serialize};

/// What a dispatch pass does on every machine.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Mode {
    /// Start the algorithm with the synthesized command of each node.
    Launch,
    /// Kill every process owned by the remote user.
    Terminate,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Launch => "launch",
            Mode::Terminate => "terminate",
        }
    }

    pub fn is_terminate(&self) -> bool {
        self == &Mode::Terminate
    }
}

/// Whether the next node is dispatched only after the previous one exits.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum WaitPolicy {
    Sequential,
    Parallel,
}

/// What happens to the remaining nodes once a dispatch fails.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FailurePolicy {
    Abort,
    Continue,
}

impl FailurePolicy {
    pub fn is_abort(&self) -> bool {
        self == &FailurePolicy::Abort
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// remote user; also the owner of the processes killed on terminate
    user: String,
    /// program (and its leading arguments) started on every machine
    program: Vec<String>,
    wait: WaitPolicy,
    failure: FailurePolicy,
    peer_format: PeerFormat,
}

impl DispatchConfig {
    /// Create a new `DispatchConfig`.
    pub fn new(user: impl Into<String>, program: Vec<String>) -> Self {
        // by default, nodes are dispatched one at a time, the first failure
        // stops the whole pass, and peers are sent as written in the config
        Self {
            user: user.into(),
            program,
            wait: WaitPolicy::Sequential,
            failure: FailurePolicy::Abort,
            peer_format: PeerFormat::Reference,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn program(&self) -> &[String] {
        &self.program
    }

    pub fn wait(&self) -> WaitPolicy {
        self.wait
    }

    pub fn set_wait(&mut self, wait: WaitPolicy) {
        self.wait = wait;
    }

    pub fn failure(&self) -> FailurePolicy {
        self.failure
    }

    pub fn set_failure(&mut self, failure: FailurePolicy) {
        self.failure = failure;
    }

    pub fn peer_format(&self) -> PeerFormat {
        self.peer_format
    }

    pub fn set_peer_format(&mut self, peer_format: PeerFormat) {
        self.peer_format = peer_format;
    }
}
