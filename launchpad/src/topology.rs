use crate::config::{Section, Variant};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Position of a machine in the config; the join key between machines and
/// the per-node relation records.
pub type NodeIndex = usize;

/// Parsing state of a single scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Unset,
    Set(i64),
}

impl Scalar {
    pub fn is_set(&self) -> bool {
        matches!(self, Scalar::Set(_))
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            Scalar::Unset => None,
            Scalar::Set(value) => Some(*value),
        }
    }
}

/// A machine line: a label, the address used to reach it, and whatever else
/// the algorithm needs to know about it (e.g. a port).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    line: usize,
    fields: Vec<String>,
}

impl Machine {
    /// Creates a new `Machine`. Callers ensure there are at least two fields.
    pub(crate) fn new(line: usize, fields: Vec<String>) -> Self {
        debug_assert!(fields.len() >= 2);
        Self { line, fields }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn label(&self) -> &str {
        &self.fields[0]
    }

    pub fn address(&self) -> &str {
        &self.fields[1]
    }

    /// Every field but the label.
    pub fn endpoint(&self) -> &[String] {
        &self.fields[1..]
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// A relation line: an owner reference followed by peer references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    line: usize,
    fields: Vec<String>,
}

impl Relation {
    pub(crate) fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn owner(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }

    /// The record without its owner token.
    pub fn peers(&self) -> &[String] {
        self.fields.get(1..).unwrap_or(&[])
    }
}

/// Records of one relation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationList {
    section: Section,
    records: Vec<Relation>,
}

impl RelationList {
    pub(crate) fn new(section: Section, records: Vec<Relation>) -> Self {
        Self { section, records }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn records(&self) -> &[Relation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A fully parsed config. Only the parser builds these, and every section
/// has exactly its declared number of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    variant: Variant,
    scalars: Vec<i64>,
    machines: Vec<Machine>,
    /// one list per relation section of the variant, in the same order
    relations: Vec<RelationList>,
}

impl Topology {
    pub(crate) fn new(
        variant: Variant,
        scalars: Vec<i64>,
        machines: Vec<Machine>,
        relations: Vec<RelationList>,
    ) -> Self {
        debug_assert_eq!(scalars.len(), variant.scalar_names().len());
        debug_assert_eq!(relations.len(), variant.relations().len());
        Self {
            variant,
            scalars,
            machines,
            relations,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// All scalars, in declaration order.
    pub fn scalars(&self) -> &[i64] {
        &self.scalars
    }

    /// Retrieves a scalar by name.
    pub fn scalar(&self, name: &str) -> Option<i64> {
        self.variant
            .scalar_names()
            .iter()
            .position(|scalar| *scalar == name)
            .map(|index| self.scalars[index])
    }

    pub fn node_count(&self) -> usize {
        self.machines.len()
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn machine(&self, index: NodeIndex) -> Result<&Machine> {
        self.machines.get(index).ok_or(Error::Index {
            index,
            node_count: self.node_count(),
        })
    }

    pub fn relations(&self) -> &[RelationList] {
        &self.relations
    }

    pub fn relation(&self, section: Section) -> Option<&RelationList> {
        self.relations.iter().find(|list| list.section == section)
    }
}
