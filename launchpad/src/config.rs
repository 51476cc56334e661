use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of the scalar holding the number of nodes, for every variant.
pub const NODE_COUNT_SCALAR: usize = 0;

/// Config variants understood by the parser. Each variant fixes the list of
/// scalars and the relation sections that follow the machine list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Variant {
    /// Mutual exclusion: `n d c iters`, then `n` machines, then `n` quorums.
    Quorum,
    /// Checkpointing: `n cr_n min_inst min_send messages`, then `n`
    /// machines, `n` neighbor lists and `cr_n` checkpoint requests.
    Checkpoint,
}

const QUORUM_SCALARS: &[&str] = &["n", "d", "c", "iters"];
const CHECKPOINT_SCALARS: &[&str] =
    &["n", "cr_n", "min_inst", "min_send", "messages"];

const QUORUM_RELATIONS: &[RelationSpec] = &[RelationSpec {
    section: Section::Quorums,
    count_scalar: NODE_COUNT_SCALAR,
    normalization: Normalization::StripOnly,
    fields: Fields::AtLeast(1),
    emission: Emission::PeerSubset,
}];

const CHECKPOINT_RELATIONS: &[RelationSpec] = &[
    RelationSpec {
        section: Section::Neighbors,
        count_scalar: NODE_COUNT_SCALAR,
        normalization: Normalization::StripOnly,
        fields: Fields::AtLeast(1),
        emission: Emission::PeerSubset,
    },
    RelationSpec {
        section: Section::CheckpointRequests,
        count_scalar: 1,
        normalization: Normalization::StripAndResplit,
        fields: Fields::Exactly(2),
        emission: Emission::Columns,
    },
];

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Quorum => "quorum",
            Variant::Checkpoint => "checkpoint",
        }
    }

    /// Names of the scalars, in the order they're read from the config.
    pub fn scalar_names(&self) -> &'static [&'static str] {
        match self {
            Variant::Quorum => QUORUM_SCALARS,
            Variant::Checkpoint => CHECKPOINT_SCALARS,
        }
    }

    /// Relation sections, in the order they appear after the machines.
    pub fn relations(&self) -> &'static [RelationSpec] {
        match self {
            Variant::Quorum => QUORUM_RELATIONS,
            Variant::Checkpoint => CHECKPOINT_RELATIONS,
        }
    }

    /// Checks whether the scalar at `index` sizes some section. Such scalars
    /// can't be negative.
    pub fn is_count_scalar(&self, index: usize) -> bool {
        index == NODE_COUNT_SCALAR
            || self
                .relations()
                .iter()
                .any(|relation| relation.count_scalar == index)
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quorum" => Ok(Variant::Quorum),
            "checkpoint" => Ok(Variant::Checkpoint),
            _ => Err(format!(
                "unknown variant {:?}; expected `quorum` or `checkpoint`",
                s
            )),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sections of a config file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Section {
    Scalars,
    Machines,
    Neighbors,
    Quorums,
    CheckpointRequests,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::Scalars => "scalar",
            Section::Machines => "machine",
            Section::Neighbors => "neighbor",
            Section::Quorums => "quorum",
            Section::CheckpointRequests => "checkpoint request",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How punctuation is removed from relation records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Normalization {
    /// `(`, `)` and `,` are removed from each field; fields stay separate.
    StripOnly,
    /// `,` becomes a space, parentheses are removed and the record is
    /// re-tokenized, so that `(a,b)` becomes two fields.
    StripAndResplit,
}

/// Number of fields a normalized relation record must have.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Fields {
    AtLeast(usize),
    Exactly(usize),
}

impl Fields {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Fields::AtLeast(min) => count >= min,
            Fields::Exactly(expected) => count == expected,
        }
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fields::AtLeast(min) => write!(f, "at least {}", min),
            Fields::Exactly(expected) => write!(f, "exactly {}", expected),
        }
    }
}

/// How a relation section ends up in each node's command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Emission {
    /// The node's own record, minus its owner token, prefixed by its size.
    PeerSubset,
    /// Every record, broadcast to all nodes one field position at a time.
    Columns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub section: Section,
    /// index of the scalar that holds the number of records
    pub count_scalar: usize,
    pub normalization: Normalization,
    pub fields: Fields,
    pub emission: Emission,
}

/// How peer references of per-node sections are written in a command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum PeerFormat {
    /// As written in the config (e.g. a node id).
    Reference,
    /// Replaced by the address of the machine with that label.
    Address,
}

/// What to do with tokens found after every section is complete.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum TrailingPolicy {
    Ignore,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// defines whether tokens after the last section are an error
    trailing: TrailingPolicy,
}

impl ParserOptions {
    /// Create a new `ParserOptions`.
    pub fn new() -> Self {
        // by default, trailing tokens are logged and ignored
        let trailing = TrailingPolicy::Ignore;
        Self { trailing }
    }

    /// Retrieve the trailing token policy.
    pub fn trailing(&self) -> TrailingPolicy {
        self.trailing
    }

    /// Changes the trailing token policy.
    pub fn set_trailing(&mut self, trailing: TrailingPolicy) {
        self.trailing = trailing;
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::new()
    }
}
