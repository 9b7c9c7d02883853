//! Canonicalize a GFA graph to the forward strand: assign every segment a
//! strand with a running registration over the links, flip links that
//! disagree, reverse-complement segments registered on the reverse strand,
//! and emit an integer-renumbered GFA with all-forward links.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use bio::alphabets::dna::revcomp;
use clap::Parser;
use log::info;
use rustc_hash::FxHashMap;

#[derive(Parser)]
#[clap(about = "Canonicalize a GFA graph to the forward strand")]
struct Cli {
    input: PathBuf,
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strand {
    Fwd,
    Rev,
}

impl Strand {
    fn parse(s: &str, line: usize) -> Result<Strand> {
        match s {
            "+" => Ok(Strand::Fwd),
            "-" => Ok(Strand::Rev),
            _ => bail!("line {line}: bad strand '{s}'"),
        }
    }

    fn flip(self) -> Strand {
        match self {
            Strand::Fwd => Strand::Rev,
            Strand::Rev => Strand::Fwd,
        }
    }
}

#[derive(Debug, Clone)]
struct Link {
    from: String,
    from_strand: Strand,
    to: String,
    to_strand: Strand,
}

impl Link {
    /// Reverse the link: swap the endpoints and invert both strands.
    fn flip(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        let (f, t) = (self.from_strand, self.to_strand);
        self.from_strand = t.flip();
        self.to_strand = f.flip();
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();
    let args = Cli::parse();

    // Segments in first-seen order; ids are 1-based.
    let mut names: Vec<String> = Vec::new();
    let mut seqs: FxHashMap<String, Vec<u8>> = FxHashMap::default();
    let mut links: Vec<Link> = Vec::new();

    let input = BufReader::new(
        File::open(&args.input).with_context(|| format!("reading {}", args.input.display()))?,
    );
    for (lineno, line) in input.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line?;
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("S") => {
                let name = fields
                    .next()
                    .with_context(|| format!("line {lineno}: S record missing name"))?;
                let seq = fields
                    .next()
                    .with_context(|| format!("line {lineno}: S record missing sequence"))?;
                ensure!(
                    !seqs.contains_key(name),
                    "line {lineno}: duplicate segment '{name}'"
                );
                names.push(name.to_owned());
                seqs.insert(name.to_owned(), seq.to_ascii_uppercase().into_bytes());
            }
            Some("L") => {
                let mut next =
                    |what: &str| fields.next().with_context(|| format!("line {lineno}: L record missing {what}"));
                let from = next("source")?.to_owned();
                let from_strand = Strand::parse(next("source strand")?, lineno)?;
                let to = next("target")?.to_owned();
                let to_strand = Strand::parse(next("target strand")?, lineno)?;
                ensure!(seqs.contains_key(&from), "line {lineno}: unknown segment '{from}'");
                ensure!(seqs.contains_key(&to), "line {lineno}: unknown segment '{to}'");
                links.push(Link {
                    from,
                    from_strand,
                    to,
                    to_strand,
                });
            }
            _ => {}
        }
    }
    info!("{} segments, {} links", seqs.len(), links.len());

    let registered = assign_strands(&mut links)?;

    let id_of: FxHashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_str(), i + 1))
        .collect();

    let mut out = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("creating {}", args.output.display()))?,
    );
    for name in &names {
        let seq = match registered.get(name) {
            Some(Strand::Rev) => revcomp(seqs[name].as_slice()),
            _ => seqs[name].clone(),
        };
        write!(out, "S\t{}\t", id_of[name.as_str()])?;
        out.write_all(&seq)?;
        out.write_all(b"\n")?;
    }
    for link in &links {
        debug_assert_eq!(registered[&link.from], link.from_strand);
        debug_assert_eq!(registered[&link.to], link.to_strand);
        writeln!(
            out,
            "L\t{}\t+\t{}\t+\t*",
            id_of[link.from.as_str()],
            id_of[link.to.as_str()]
        )?;
    }
    Ok(())
}

/// Register a strand per segment with a running assignment over the links,
/// flipping links that disagree with it. Errors when a link's endpoints are
/// both registered and exactly one of them disagrees.
fn assign_strands(links: &mut [Link]) -> Result<FxHashMap<String, Strand>> {
    let mut registered: FxHashMap<String, Strand> = FxHashMap::default();
    for link in links {
        let from_reg = registered.get(&link.from).copied();
        let to_reg = registered.get(&link.to).copied();
        match (from_reg, to_reg) {
            (Some(from_reg), Some(to_reg)) => {
                let from_agrees = link.from_strand == from_reg;
                let to_agrees = link.to_strand == to_reg;
                if !from_agrees && !to_agrees {
                    link.flip();
                } else if from_agrees != to_agrees {
                    bail!(
                        "contradictory strand information at link {} {} -> {} {}",
                        link.from,
                        if link.from_strand == Strand::Fwd { "+" } else { "-" },
                        link.to,
                        if link.to_strand == Strand::Fwd { "+" } else { "-" },
                    );
                }
            }
            _ => {
                // Flip if the registered endpoint disagrees; then both
                // endpoints carry their final strands. Flipping swaps the
                // endpoints, so register by name rather than by position.
                if from_reg.is_some_and(|r| r != link.from_strand)
                    || to_reg.is_some_and(|r| r != link.to_strand)
                {
                    link.flip();
                }
                registered
                    .entry(link.from.clone())
                    .or_insert(link.from_strand);
                registered
                    .entry(link.to.clone())
                    .or_insert(link.to_strand);
            }
        }
    }
    Ok(registered)
}
