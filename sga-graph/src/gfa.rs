use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use rustc_hash::FxHashMap;
use sga_types::*;
use thiserror::Error;

use crate::graph::{chain_nodes, GraphBuilder};

#[derive(Debug, Error)]
pub enum GfaError {
    #[error("cannot read graph: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("line {line}: link references unknown segment '{name}'")]
    UnknownSegment { line: usize, name: String },
    #[error("line {line}: reverse-strand link; canonicalize the graph with gfa-fwd first")]
    ReverseStrand { line: usize },
}

fn parse_err(line: usize, msg: impl Into<String>) -> GfaError {
    GfaError::Parse {
        line,
        msg: msg.into(),
    }
}

/// Parse a forward-strand GFA (`S` and `L` records) into a graph builder.
/// Each segment becomes a chain of `Orig` edges; links join the last node of
/// one segment to the first node of another. Other record types are ignored.
pub fn parse_gfa<R: BufRead>(input: R) -> Result<GraphBuilder, GfaError> {
    let mut b = GraphBuilder::new();
    // segment name -> (first node, last node)
    let mut segments: FxHashMap<String, (Node, Node)> = FxHashMap::default();
    let mut links: Vec<(usize, String, String)> = Vec::new();

    for (lineno, line) in input.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line?;
        let mut fields = line.split('\t').flat_map(|f| f.split(' ')).filter(|f| !f.is_empty());
        match fields.next() {
            Some("S") => {
                let name = fields
                    .next()
                    .ok_or_else(|| parse_err(lineno, "S record missing name"))?
                    .to_owned();
                let seq = fields
                    .next()
                    .ok_or_else(|| parse_err(lineno, "S record missing sequence"))?
                    .to_ascii_uppercase()
                    .into_bytes();
                if seq.is_empty() {
                    return Err(parse_err(lineno, format!("segment '{name}' is empty")));
                }
                if let Some(&c) = seq.iter().find(|&&c| !is_nucl(c)) {
                    return Err(parse_err(
                        lineno,
                        format!("segment '{name}' contains non-ACGT character '{}'", c as char),
                    ));
                }
                if segments.contains_key(&name) {
                    return Err(parse_err(lineno, format!("duplicate segment '{name}'")));
                }
                let ends = chain_nodes(&mut b, None, &seq);
                segments.insert(name, ends);
            }
            Some("L") => {
                let from = fields
                    .next()
                    .ok_or_else(|| parse_err(lineno, "L record missing source"))?
                    .to_owned();
                let from_strand = fields
                    .next()
                    .ok_or_else(|| parse_err(lineno, "L record missing source strand"))?;
                let to = fields
                    .next()
                    .ok_or_else(|| parse_err(lineno, "L record missing target"))?
                    .to_owned();
                let to_strand = fields
                    .next()
                    .ok_or_else(|| parse_err(lineno, "L record missing target strand"))?;
                if from_strand != "+" || to_strand != "+" {
                    return Err(GfaError::ReverseStrand { line: lineno });
                }
                links.push((lineno, from, to));
            }
            _ => {}
        }
    }

    for (lineno, from, to) in links {
        let &(_, last) = segments
            .get(&from)
            .ok_or_else(|| GfaError::UnknownSegment {
                line: lineno,
                name: from.clone(),
            })?;
        let &(first, _) = segments.get(&to).ok_or_else(|| GfaError::UnknownSegment {
            line: lineno,
            name: to.clone(),
        })?;
        b.add_edge(last, first, EdgeType::Orig);
    }

    info!(
        "parsed GFA: {} segments, {} nodes",
        segments.len(),
        b.num_nodes() - 1
    );
    Ok(b)
}

pub fn load_gfa(path: &Path) -> Result<GraphBuilder, GfaError> {
    parse_gfa(BufReader::new(File::open(path)?))
}
