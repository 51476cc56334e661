use crate::config::{
    ParserOptions, Section, TrailingPolicy, Variant, NODE_COUNT_SCALAR,
};
use crate::error::{Error, Result};
use crate::normalize;
use crate::token::{self, Line};
use crate::topology::{Machine, Relation, RelationList, Scalar, Topology};
use std::path::Path;

/// Scalars used to mean "not parsed yet" with this value, so configs that
/// contain it are rejected.
const UNSET_SENTINEL: i64 = -1;

/// Machine lines need at least a label and an address.
const MACHINE_MIN_FIELDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadingScalars,
    ReadingMachines,
    /// index into the variant's relation sections
    ReadingRelations(usize),
    Done,
}

struct Parser {
    variant: Variant,
    options: ParserOptions,
    state: State,
    scalars: Vec<Scalar>,
    machines: Vec<Machine>,
    relations: Vec<Vec<Relation>>,
}

impl Parser {
    fn new(variant: Variant, options: ParserOptions) -> Self {
        let scalars = vec![Scalar::Unset; variant.scalar_names().len()];
        let relations = vec![Vec::new(); variant.relations().len()];
        Self {
            variant,
            options,
            state: State::ReadingScalars,
            scalars,
            machines: Vec::new(),
            relations,
        }
    }

    /// Number of records declared for the section sized by `count_scalar`.
    /// Only called once every scalar is set.
    fn declared(&self, count_scalar: usize) -> usize {
        self.scalars[count_scalar]
            .value()
            .and_then(|value| usize::try_from(value).ok())
            .unwrap_or(0)
    }

    fn feed(&mut self, line: Line<'_>) -> Result<()> {
        let mut rest = &line.tokens[..];
        while let Some((token, tail)) = rest.split_first() {
            match self.state {
                State::ReadingScalars => {
                    self.set_scalar(line.number, token)?;
                    rest = tail;
                }
                State::ReadingMachines => {
                    self.push_machine(line.number, rest)?;
                    rest = &[];
                }
                State::ReadingRelations(index) => {
                    let fields = rest.iter().map(|f| f.to_string()).collect();
                    let relation = Relation::new(line.number, fields);
                    self.relations[index].push(relation);
                    rest = &[];
                }
                State::Done => {
                    self.trailing(line.number, rest)?;
                    rest = &[];
                }
            }
            self.advance();
        }
        Ok(())
    }

    fn set_scalar(&mut self, line: usize, token: &str) -> Result<()> {
        // scalars are set strictly in order
        let index = self.scalars.iter().take_while(|s| s.is_set()).count();
        let name = self.variant.scalar_names()[index];
        let malformed = |reason: String| Error::MalformedScalar {
            line,
            name,
            token: token.to_string(),
            reason,
        };

        let value = token
            .parse::<i64>()
            .map_err(|e| malformed(e.to_string()))?;
        if value == UNSET_SENTINEL {
            return Err(malformed(format!(
                "{} is reserved and can't be used as a value",
                UNSET_SENTINEL
            )));
        }
        if value < 0 && self.variant.is_count_scalar(index) {
            return Err(malformed(String::from(
                "a record count can't be negative",
            )));
        }

        tracing::trace!("line {}: scalar {} = {}", line, name, value);
        self.scalars[index] = Scalar::Set(value);
        Ok(())
    }

    fn push_machine(&mut self, line: usize, tokens: &[&str]) -> Result<()> {
        if tokens.len() < MACHINE_MIN_FIELDS {
            return Err(Error::MalformedRecord {
                line,
                section: Section::Machines,
                reason: format!(
                    "expected a label and an address but found {:?}",
                    tokens
                ),
            });
        }
        let fields = tokens.iter().map(|f| f.to_string()).collect();
        self.machines.push(Machine::new(line, fields));
        Ok(())
    }

    fn trailing(&self, line: usize, tokens: &[&str]) -> Result<()> {
        let tokens: Vec<_> = tokens.iter().map(|t| t.to_string()).collect();
        match self.options.trailing() {
            TrailingPolicy::Ignore => {
                tracing::warn!(
                    "line {}: ignoring tokens after the last section: {:?}",
                    line,
                    tokens
                );
                Ok(())
            }
            TrailingPolicy::Reject => {
                Err(Error::TrailingTokens { line, tokens })
            }
        }
    }

    /// Moves to the next state for as long as the current section is
    /// complete. Sections declared with zero records are skipped right away.
    fn advance(&mut self) {
        loop {
            let next = match self.state {
                State::ReadingScalars
                    if self.scalars.iter().all(Scalar::is_set) =>
                {
                    State::ReadingMachines
                }
                State::ReadingMachines
                    if self.machines.len()
                        == self.declared(NODE_COUNT_SCALAR) =>
                {
                    tracing::debug!("read {} machines", self.machines.len());
                    State::ReadingRelations(0)
                }
                State::ReadingRelations(index)
                    if index == self.relations.len() =>
                {
                    State::Done
                }
                State::ReadingRelations(index) => {
                    let spec = &self.variant.relations()[index];
                    let declared = self.declared(spec.count_scalar);
                    if self.relations[index].len() == declared {
                        tracing::debug!(
                            "read {} {} records",
                            self.relations[index].len(),
                            spec.section
                        );
                        State::ReadingRelations(index + 1)
                    } else {
                        return;
                    }
                }
                _ => return,
            };
            self.state = next;
        }
    }

    fn finish(self) -> Result<Topology> {
        let incomplete = |section, expected, found| Error::IncompleteTopology {
            section,
            expected,
            found,
        };
        match self.state {
            State::Done => {}
            State::ReadingScalars => {
                let found = self.scalars.iter().filter(|s| s.is_set()).count();
                let expected = self.scalars.len();
                return Err(incomplete(Section::Scalars, expected, found));
            }
            State::ReadingMachines => {
                return Err(incomplete(
                    Section::Machines,
                    self.declared(NODE_COUNT_SCALAR),
                    self.machines.len(),
                ));
            }
            State::ReadingRelations(index) => {
                let spec = &self.variant.relations()[index];
                return Err(incomplete(
                    spec.section,
                    self.declared(spec.count_scalar),
                    self.relations[index].len(),
                ));
            }
        }

        let scalars = self.scalars.iter().filter_map(Scalar::value).collect();
        let relations = self
            .variant
            .relations()
            .iter()
            .zip(self.relations)
            .map(|(spec, records)| RelationList::new(spec.section, records))
            .collect();
        Ok(Topology::new(self.variant, scalars, self.machines, relations))
    }
}

/// Parses `input` without cleaning up relation records.
pub(crate) fn parse_raw(
    input: &str,
    variant: Variant,
    options: ParserOptions,
) -> Result<Topology> {
    let mut parser = Parser::new(variant, options);
    for line in token::lines(input).filter(|line| !line.is_empty()) {
        parser.feed(line)?;
    }
    parser.finish()
}

/// Parses and normalizes a config in the format of `variant`.
pub fn parse(
    input: &str,
    variant: Variant,
    options: ParserOptions,
) -> Result<Topology> {
    let raw = parse_raw(input, variant, options)?;
    normalize::normalize(&raw)
}

/// Reads the config at `path` and parses it.
pub fn parse_file(
    path: impl AsRef<Path>,
    variant: Variant,
    options: ParserOptions,
) -> Result<Topology> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("parsing {:?} as a {} config", path, variant);
    parse(&input, variant, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUORUM: &str = "\
# n d c iters
2 1 10 5
A 10.0.0.1
B 10.0.0.2
(A, B)
(B, A)
";

    const CHECKPOINT: &str = "\
# nodes, checkpoint requests, min instance delay, min send delay, messages
4 2 100 5 20

0 dc01 3332   # node 0
1 dc02 5678
2 dc03 5231
3 dc04 2311

# neighbors
(0, 1, 2)
(1, 0)
(2, 0, 3)
(3, 2)

# checkpoint / recovery requests
(c,1)
(r,3)
";

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn quorum() {
        let topology = parse(QUORUM, Variant::Quorum, ParserOptions::new())
            .expect("quorum config should parse");
        assert_eq!(topology.scalars(), &[2, 1, 10, 5]);
        assert_eq!(topology.scalar("iters"), Some(5));
        assert_eq!(topology.node_count(), 2);
        assert_eq!(topology.machines()[1].label(), "B");
        assert_eq!(topology.machines()[1].address(), "10.0.0.2");

        let quorums = topology
            .relation(Section::Quorums)
            .expect("quorums should exist");
        assert_eq!(quorums.len(), 2);
        assert_eq!(quorums.records()[0].fields(), &strings(&["A", "B"])[..]);
        assert_eq!(quorums.records()[1].owner(), Some("B"));
    }

    #[test]
    fn checkpoint() {
        let topology =
            parse(CHECKPOINT, Variant::Checkpoint, ParserOptions::new())
                .expect("checkpoint config should parse");
        assert_eq!(topology.scalars(), &[4, 2, 100, 5, 20]);
        assert_eq!(topology.node_count(), 4);
        assert_eq!(
            topology.machines()[0].endpoint(),
            &strings(&["dc01", "3332"])[..]
        );
        assert_eq!(topology.machines()[0].line(), 4);

        let neighbors = topology
            .relation(Section::Neighbors)
            .expect("neighbors should exist");
        assert_eq!(neighbors.len(), 4);
        assert_eq!(neighbors.records()[2].peers(), &strings(&["0", "3"])[..]);

        let requests = topology
            .relation(Section::CheckpointRequests)
            .expect("checkpoint requests should exist");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests.records()[0].fields(), &strings(&["c", "1"])[..]);
        assert_eq!(requests.records()[1].fields(), &strings(&["r", "3"])[..]);
    }

    #[test]
    fn comments_and_blank_lines() {
        // each of these should yield the scalar 10 and nothing else
        for prefix in ["# comment only\n10\n", "\n\n10\n", "10 # nodes\n"] {
            let config = format!(
                "{}0 0 0 0\n{}",
                prefix,
                (0..10)
                    .map(|i| format!("{} host{}\n", i, i))
                    .chain((0..10).map(|i| format!("({})\n", i)))
                    .collect::<String>()
            );
            let topology =
                parse(&config, Variant::Checkpoint, ParserOptions::new())
                    .expect("config should parse");
            assert_eq!(topology.scalars(), &[10, 0, 0, 0, 0]);
            assert_eq!(topology.node_count(), 10);
        }
    }

    #[test]
    fn scalars_and_machine_on_the_same_line() {
        let config = "1 0 0 0 0 0 localhost 3000\n(0)\n";
        let topology = parse(config, Variant::Checkpoint, ParserOptions::new())
            .expect("config should parse");
        assert_eq!(
            topology.machines()[0].fields(),
            &strings(&["0", "localhost", "3000"])[..]
        );
    }

    #[test]
    fn malformed_scalar() {
        let config = "4 two 100 5 20\n";
        match parse(config, Variant::Checkpoint, ParserOptions::new()) {
            Err(Error::MalformedScalar {
                line, name, token, ..
            }) => {
                assert_eq!(line, 1);
                assert_eq!(name, "cr_n");
                assert_eq!(token, "two");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn sentinel_and_negative_scalars() {
        let sentinel = "2 1 -1 5\n";
        assert!(matches!(
            parse(sentinel, Variant::Quorum, ParserOptions::new()),
            Err(Error::MalformedScalar { name: "c", .. })
        ));

        // negative counts are rejected, other negative values are fine
        let negative_count = "-2 1 3 5\n";
        assert!(matches!(
            parse(negative_count, Variant::Quorum, ParserOptions::new()),
            Err(Error::MalformedScalar { name: "n", .. })
        ));
        let negative_value = "1 -3 3 5\na host\n(a)\n";
        let topology =
            parse(negative_value, Variant::Quorum, ParserOptions::new())
                .expect("config should parse");
        assert_eq!(topology.scalar("d"), Some(-3));
    }

    #[test]
    fn malformed_machine() {
        let config = "2 1 10 5\nA 10.0.0.1\nB\n";
        assert!(matches!(
            parse(config, Variant::Quorum, ParserOptions::new()),
            Err(Error::MalformedRecord {
                line: 3,
                section: Section::Machines,
                ..
            })
        ));
    }

    #[test]
    fn incomplete() {
        // missing scalars
        assert!(matches!(
            parse("2 1\n", Variant::Quorum, ParserOptions::new()),
            Err(Error::IncompleteTopology {
                section: Section::Scalars,
                expected: 4,
                found: 2,
            })
        ));

        // missing a machine
        assert!(matches!(
            parse(
                "2 1 10 5\nA 10.0.0.1\n",
                Variant::Quorum,
                ParserOptions::new()
            ),
            Err(Error::IncompleteTopology {
                section: Section::Machines,
                expected: 2,
                found: 1,
            })
        ));

        // missing a quorum
        let config = "2 1 10 5\nA 10.0.0.1\nB 10.0.0.2\n(A, B)\n";
        assert!(matches!(
            parse(config, Variant::Quorum, ParserOptions::new()),
            Err(Error::IncompleteTopology {
                section: Section::Quorums,
                expected: 2,
                found: 1,
            })
        ));

        // missing a checkpoint request
        let config = CHECKPOINT.replace("(r,3)", "");
        assert!(matches!(
            parse(&config, Variant::Checkpoint, ParserOptions::new()),
            Err(Error::IncompleteTopology {
                section: Section::CheckpointRequests,
                expected: 2,
                found: 1,
            })
        ));
    }

    #[test]
    fn no_checkpoint_requests() {
        let config = "2 0 1 1 1\n0 h0 1\n1 h1 2\n(0, 1)\n(1, 0)\n";
        let topology = parse(config, Variant::Checkpoint, ParserOptions::new())
            .expect("config should parse");
        let requests = topology
            .relation(Section::CheckpointRequests)
            .expect("checkpoint requests should exist");
        assert!(requests.is_empty());
    }

    #[test]
    fn trailing_tokens() {
        let config = format!("{}garbage here\n", QUORUM);

        // ignored by default
        let topology = parse(&config, Variant::Quorum, ParserOptions::new())
            .expect("trailing tokens should be ignored");
        assert_eq!(topology.node_count(), 2);

        // rejected if asked to
        let mut options = ParserOptions::new();
        options.set_trailing(TrailingPolicy::Reject);
        match parse(&config, Variant::Quorum, options) {
            Err(Error::TrailingTokens { line, tokens }) => {
                assert_eq!(line, 7);
                assert_eq!(tokens, strings(&["garbage", "here"]));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_file() {
        let result = parse_file(
            "/definitely/not/a/config",
            Variant::Quorum,
            ParserOptions::new(),
        );
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
