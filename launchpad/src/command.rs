use crate::args;
use crate::config::{Emission, PeerFormat};
use crate::error::{Error, Result};
use crate::topology::{NodeIndex, RelationList, Topology};
use serde::{Deserialize, Serialize};

/// Number of field positions broadcast for column-emitted sections.
const COLUMNS: usize = 2;

/// Arguments of the algorithm instance of some node. The remote process reads
/// them positionally:
/// - every scalar, in declaration order
/// - the node index
/// - the address fields (all but the label) of every machine
/// - for per-node sections: the number of peers followed by the peers
/// - for column sections: every first field, then every second field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandVector {
    node: NodeIndex,
    args: Vec<String>,
}

impl CommandVector {
    pub fn node(&self) -> NodeIndex {
        self.node
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

/// Computes the command of node `node`, with peers written as in the config.
/// Fails if there's no such node.
pub fn synthesize(
    topology: &Topology,
    node: NodeIndex,
) -> Result<CommandVector> {
    synthesize_with(topology, node, PeerFormat::Reference)
}

/// Computes the command of node `node`, with peers written in `format`.
pub fn synthesize_with(
    topology: &Topology,
    node: NodeIndex,
    format: PeerFormat,
) -> Result<CommandVector> {
    let node_count = topology.node_count();
    if node >= node_count {
        return Err(Error::Index {
            index: node,
            node_count,
        });
    }

    let mut args: Vec<String> =
        topology.scalars().iter().map(|s| s.to_string()).collect();
    args.extend(args![node]);

    // full membership, identical for every node
    for machine in topology.machines() {
        args.extend(machine.endpoint().iter().cloned());
    }

    let specs = topology.variant().relations();
    for (spec, list) in specs.iter().zip(topology.relations()) {
        match spec.emission {
            Emission::PeerSubset => {
                peer_subset(topology, list, node, format, &mut args)?
            }
            Emission::Columns => columns(list, &mut args),
        }
    }

    Ok(CommandVector { node, args })
}

/// Computes the command of every node, in node order.
pub fn synthesize_all(
    topology: &Topology,
    format: PeerFormat,
) -> Result<Vec<CommandVector>> {
    (0..topology.node_count())
        .map(|node| synthesize_with(topology, node, format))
        .collect()
}

fn peer_subset(
    topology: &Topology,
    list: &RelationList,
    node: NodeIndex,
    format: PeerFormat,
    args: &mut Vec<String>,
) -> Result<()> {
    // per-node sections have one record per machine, in machine order
    let record = list.records().get(node).ok_or(Error::Index {
        index: node,
        node_count: list.len(),
    })?;
    let peers = record.peers();
    args.extend(args![peers.len()]);
    for peer in peers {
        let peer = match format {
            PeerFormat::Reference => peer.clone(),
            PeerFormat::Address => topology
                .machines()
                .iter()
                .find(|machine| machine.label() == peer)
                .map(|machine| machine.address().to_string())
                .ok_or_else(|| Error::UnknownPeer {
                    node,
                    peer: peer.clone(),
                })?,
        };
        args.push(peer);
    }
    Ok(())
}

fn columns(list: &RelationList, args: &mut Vec<String>) {
    for column in 0..COLUMNS {
        args.extend(
            list.records()
                .iter()
                .filter_map(|record| record.fields().get(column).cloned()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParserOptions, Variant};
    use crate::parse;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    const QUORUM: &str = "\
2 1 10 5
A 10.0.0.1
B 10.0.0.2
(A, B)
(B, A)
";

    const CHECKPOINT: &str = "\
3 2 100 5 20
0 dc01 3332
1 dc02 5678
2 dc03 5231
(0, 1, 2)
(1, 0)
(2, 0)
(c,1)
(r,2)
";

    fn quorum() -> Topology {
        parse::parse(QUORUM, Variant::Quorum, ParserOptions::new())
            .expect("quorum config should parse")
    }

    fn checkpoint() -> Topology {
        parse::parse(CHECKPOINT, Variant::Checkpoint, ParserOptions::new())
            .expect("checkpoint config should parse")
    }

    #[test]
    fn quorum_two_nodes() {
        let topology = quorum();
        let command = synthesize(&topology, 0).expect("node 0 should exist");
        assert_eq!(command.node(), 0);
        assert_eq!(
            command.args(),
            &args!["2", "1", "10", "5", 0, "10.0.0.1", "10.0.0.2", 1, "B"][..]
        );

        let command = synthesize(&topology, 1).expect("node 1 should exist");
        assert_eq!(
            command.into_args(),
            args!["2", "1", "10", "5", 1, "10.0.0.1", "10.0.0.2", 1, "A"]
        );
    }

    #[test]
    fn checkpoint_layout() {
        let topology = checkpoint();
        let command = synthesize(&topology, 0).expect("node 0 should exist");
        let expected = args![
            // scalars
            3, 2, 100, 5, 20,
            // node index
            0,
            // addresses
            "dc01", 3332, "dc02", 5678, "dc03", 5231,
            // neighbors
            2, 1, 2,
            // checkpoint requests, column by column
            "c", "r", 1, 2,
        ];
        assert_eq!(command.args(), &expected[..]);

        let command = synthesize(&topology, 2).expect("node 2 should exist");
        let expected = args![
            3, 2, 100, 5, 20, 2, "dc01", 3332, "dc02", 5678, "dc03", 5231, 1,
            0, "c", "r", 1, 2,
        ];
        assert_eq!(command.args(), &expected[..]);
    }

    #[test]
    fn no_checkpoint_requests() {
        let config = "2 0 1 1 1\n0 h0 1\n1 h1 2\n(0, 1)\n(1, 0)\n";
        let topology =
            parse::parse(config, Variant::Checkpoint, ParserOptions::new())
                .expect("config should parse");
        let command = synthesize(&topology, 1).expect("node 1 should exist");
        assert_eq!(
            command.args(),
            &args![2, 0, 1, 1, 1, 1, "h0", 1, "h1", 2, 1, 0][..]
        );
    }

    #[test]
    fn peers_as_addresses() {
        let topology = quorum();
        let command = synthesize_with(&topology, 0, PeerFormat::Address)
            .expect("node 0 should exist");
        let args = command.args();
        // broadcast addresses
        assert_eq!(&args[5..7], &args!["10.0.0.1", "10.0.0.2"][..]);
        // self-exclusive peers
        assert_eq!(&args[7..], &args![1, "10.0.0.2"][..]);

        // peers must name a machine
        let config = QUORUM.replace("(B, A)", "(B, C)");
        let topology =
            parse::parse(&config, Variant::Quorum, ParserOptions::new())
                .expect("config should parse");
        assert!(synthesize_with(&topology, 0, PeerFormat::Address).is_ok());
        match synthesize_with(&topology, 1, PeerFormat::Address) {
            Err(Error::UnknownPeer { node, peer }) => {
                assert_eq!(node, 1);
                assert_eq!(peer, "C");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn out_of_range() {
        let topology = quorum();
        assert!(matches!(
            synthesize(&topology, 2),
            Err(Error::Index {
                index: 2,
                node_count: 2
            })
        ));
    }

    #[test]
    fn all_nodes() {
        let topology = checkpoint();
        let commands = synthesize_all(&topology, PeerFormat::Reference)
            .expect("all nodes should exist");
        assert_eq!(commands.len(), 3);
        for (index, command) in commands.iter().enumerate() {
            assert_eq!(command.node(), index);
        }
    }

    #[quickcheck]
    fn commands_share_everything_but_node_and_peers(
        n: u8,
        peers: u8,
    ) -> TestResult {
        let n = (n % 8) as usize + 1;
        let peers = (peers as usize) % n;

        // node i is a neighbor of the `peers` nodes that follow it
        let mut config = format!("{} 0 0 0 0\n", n);
        for i in 0..n {
            config.push_str(&format!("{} 10.0.0.{} {}\n", i, i, 3000 + i));
        }
        for i in 0..n {
            let neighbors: Vec<_> = (0..=peers)
                .map(|k| ((i + k) % n).to_string())
                .collect();
            config.push_str(&format!("({})\n", neighbors.join(", ")));
        }
        let topology =
            parse::parse(&config, Variant::Checkpoint, ParserOptions::new())
                .expect("generated config should parse");

        let scalars = 5;
        let addresses: Vec<_> = (0..n)
            .flat_map(|i| args![format!("10.0.0.{}", i), 3000 + i])
            .collect();
        let ok = (0..n).all(|i| {
            let command = synthesize(&topology, i).expect("node should exist");
            let args = command.args();
            let (head, tail) = args.split_at(scalars + 1);
            let (members, subset) = tail.split_at(2 * n);
            let own = i.to_string();
            head[..scalars] == args![n, 0, 0, 0, 0][..]
                && head[scalars] == own
                && members == &addresses[..]
                && subset[0] == peers.to_string()
                && subset.len() == peers + 1
                && subset[1..].iter().all(|peer| *peer != own)
        });
        TestResult::from_bool(ok)
    }
}
