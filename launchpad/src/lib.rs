#![deny(rust_2018_idioms)]

// This module contains the `args!` macro and other small helpers.
#[macro_use]
pub mod util;

// This module contains the definition of `Error`.
pub mod error;

// This module contains the definition of `Variant`, `Section`,
// `RelationSpec` and `ParserOptions`.
pub mod config;

// This module contains the comment-aware line tokenizer.
pub mod token;

// This module contains the definition of `Topology` and its records.
pub mod topology;

// This module contains the config parser.
pub mod parse;

// This module contains the cleanup of relation records.
pub mod normalize;

// This module contains the definition of `CommandVector` and its synthesis.
pub mod command;

// Re-exports.
pub use command::{synthesize, synthesize_all, synthesize_with, CommandVector};
pub use config::{ParserOptions, PeerFormat, TrailingPolicy, Variant};
pub use error::{Error, Result};
pub use parse::{parse, parse_file};
pub use topology::{NodeIndex, Topology};
