use crate::config::{Normalization, RelationSpec};
use crate::error::{Error, Result};
use crate::topology::{Relation, RelationList, Topology};

fn is_paren(c: char) -> bool {
    c == '(' || c == ')'
}

/// Removes `(`, `)` and `,` from a single field.
pub fn strip(field: &str) -> String {
    field.chars().filter(|&c| !is_paren(c) && c != ',').collect()
}

/// Cleans the fields of a relation record according to `mode`. Fields made
/// only of punctuation (e.g. a lonely `(`) vanish; every other field is kept.
pub fn normalize_fields(fields: &[String], mode: Normalization) -> Vec<String> {
    match mode {
        Normalization::StripOnly => fields
            .iter()
            .map(|field| strip(field))
            .filter(|field| !field.is_empty())
            .collect(),
        Normalization::StripAndResplit => fields
            .iter()
            .map(|field| field.replace(',', " ").replace(is_paren, ""))
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .map(String::from)
            .collect(),
    }
}

fn normalize_list(
    spec: &RelationSpec,
    list: &RelationList,
) -> Result<RelationList> {
    let records = list
        .records()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let fields = normalize_fields(record.fields(), spec.normalization);
            if !spec.fields.accepts(fields.len()) {
                return Err(Error::Normalization {
                    line: record.line(),
                    section: spec.section,
                    record: index,
                    reason: format!(
                        "expected {} fields but found {} ({:?})",
                        spec.fields,
                        fields.len(),
                        fields
                    ),
                });
            }
            Ok(Relation::new(record.line(), fields))
        })
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(
        "normalized {} {} records",
        records.len(),
        spec.section
    );
    Ok(RelationList::new(spec.section, records))
}

/// Returns a copy of `topology` with every relation record cleaned according
/// to the normalization mode of its section. Running it on an already
/// normalized topology returns an equal topology.
pub fn normalize(topology: &Topology) -> Result<Topology> {
    let variant = topology.variant();
    let relations = variant
        .relations()
        .iter()
        .zip(topology.relations())
        .map(|(spec, list)| normalize_list(spec, list))
        .collect::<Result<Vec<_>>>()?;
    Ok(Topology::new(
        variant,
        topology.scalars().to_vec(),
        topology.machines().to_vec(),
        relations,
    ))
}
