use crate::config::Section;
use crate::topology::NodeIndex;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a config that could not be read or parsed.
pub const EXIT_MALFORMED: i32 = 1;
/// Exit code for a config whose sections didn't reach their declared counts.
pub const EXIT_INCOMPLETE: i32 = 2;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between reading a config file and
/// synthesizing the command of some node.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scalar-position token is not a valid integer.
    #[error("line {line}: malformed scalar `{name}` ({token:?}): {reason}")]
    MalformedScalar {
        line: usize,
        name: &'static str,
        token: String,
        reason: String,
    },

    #[error("line {line}: malformed {section} record: {reason}")]
    MalformedRecord {
        line: usize,
        section: Section,
        reason: String,
    },

    #[error("line {line}: unexpected tokens after the last section: {tokens:?}")]
    TrailingTokens { line: usize, tokens: Vec<String> },

    /// Stream ended before some section reached its declared count.
    #[error("incomplete topology: expected {expected} {section} entries but found {found}")]
    IncompleteTopology {
        section: Section,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {section} record {record} can't be normalized: {reason}")]
    Normalization {
        line: usize,
        section: Section,
        record: usize,
        reason: String,
    },

    #[error("node {node}: peer {peer:?} doesn't match any machine label")]
    UnknownPeer { node: NodeIndex, peer: String },

    #[error("node index {index} out of range (node count is {node_count})")]
    Index { index: NodeIndex, node_count: usize },
}

impl Error {
    /// Process exit code a command-line wrapper should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::IncompleteTopology { .. } => EXIT_INCOMPLETE,
            _ => EXIT_MALFORMED,
        }
    }
}
