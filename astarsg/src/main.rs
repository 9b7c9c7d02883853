use std::fs::File;
use std::io::{stderr, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, ensure, Context, Result};
use astarsg::cli::{Algorithm, Cli};
use astarsg::stats::AlignStats;
use astarsg::{Aligner, Alignment, AlignParams, Outcome};
use clap::Parser;
use itertools::Itertools;
use log::{info, warn, LevelFilter};
use sga_heuristic::{AstarHeuristic, NoCost, PrefixLookahead, PrefixShared, SeedsWithErrors};
use sga_types::{is_nucl, Read};

fn main() -> Result<()> {
    let args = Cli::parse();
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .filter_level(match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    ensure!(args.threads >= 1, "--threads must be at least 1");
    ensure!(args.k_best >= 1, "--k-best must be at least 1");

    let start = Instant::now();

    // Load the graph and attach the trie.
    let mut builder = sga_graph::load_gfa(&args.graph)
        .with_context(|| format!("reading {}", args.graph.display()))?;
    let ref_nodes = builder.num_nodes() - 1;
    ensure!(ref_nodes > 0, "the graph is empty");
    let depth = args.resolved_tree_depth(ref_nodes);
    if args.algorithm == Algorithm::AstarSeeds {
        ensure!(
            args.seeds.seed_len > depth,
            "--seed-len ({}) must exceed the trie depth ({depth})",
            args.seeds.seed_len
        );
    }
    builder.add_trie(depth);
    let graph = builder.finish();
    info!(
        "graph: {ref_nodes} reference nodes, trie depth {depth}, {} nodes total",
        graph.num_nodes()
    );

    let reads = load_reads(&args.query)?;
    ensure!(!reads.is_empty(), "no reads in {}", args.query.display());
    info!("aligning {} reads on {} thread(s)", reads.len(), args.threads);

    let costs = args.costs.to_costs();
    let params = AlignParams {
        costs,
        greedy_match: args.greedy_match,
        max_align_cost: args.max_align_cost,
    };

    // The prefix memo and equivalence classes are shared across threads.
    let prefix_shared = (args.algorithm == Algorithm::AstarPrefix)
        .then(|| PrefixShared::new(&graph, costs, args.prefix));

    let threads = args.threads.min(reads.len());
    let chunk_size = reads.len().div_ceil(threads);

    let mut stats = AlignStats::default();
    let mut rows: Vec<String> = Vec::with_capacity(reads.len());
    let mut heuristic_report = Vec::new();

    std::thread::scope(|scope| -> Result<()> {
        let graph = &graph;
        let handles = reads
            .chunks(chunk_size)
            .enumerate()
            .map(|(thread_idx, chunk)| {
                let prefix_shared = prefix_shared.clone();
                let seeds = args.seeds;
                scope.spawn(move || {
                    let mut heuristic: Box<dyn AstarHeuristic + '_> = match args.algorithm {
                        Algorithm::Dijkstra => Box::new(NoCost),
                        Algorithm::AstarSeeds => {
                            Box::new(SeedsWithErrors::new(graph, costs, seeds))
                        }
                        Algorithm::AstarPrefix => {
                            Box::new(PrefixLookahead::new(prefix_shared.unwrap()))
                        }
                    };
                    if thread_idx == 0 {
                        let _ = heuristic.print_params(&mut stderr());
                    }

                    let mut aligner = Aligner::new(graph, params, heuristic.as_mut());
                    let rows: Vec<String> = chunk
                        .iter()
                        .map(|r| format_row(r, &aligner.readmap(r, args.k_best)))
                        .collect();
                    let stats = aligner.stats;

                    let mut report = Vec::new();
                    let _ = heuristic.print_stats(&mut report);
                    (stats, rows, report)
                })
            })
            .collect_vec();

        for (thread_idx, handle) in handles.into_iter().enumerate() {
            let Ok((thread_stats, thread_rows, report)) = handle.join() else {
                bail!("alignment thread panicked");
            };
            stats += thread_stats;
            rows.extend(thread_rows);
            if thread_idx == 0 {
                heuristic_report = report;
            }
        }
        Ok(())
    })?;

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join("alignments.tsv");
        let mut out = BufWriter::new(
            File::create(&path).with_context(|| format!("creating {}", path.display()))?,
        );
        writeln!(out, "read\tstatus\tcost\tpath")?;
        for row in &rows {
            writeln!(out, "{row}")?;
        }
        info!("wrote {}", path.display());
    }

    let err = &mut stderr();
    stats.print(err)?;
    err.write_all(&heuristic_report)?;
    info!("done in {:.3}s", start.elapsed().as_secs_f32());
    Ok(())
}

fn format_row(read: &Read, alignment: &Alignment) -> String {
    let status = match alignment.outcome {
        Outcome::Unique => "unique",
        Outcome::Ambiguous => "ambiguous",
        Outcome::NoAlignment => "no-alignment",
    };
    let cost = match alignment.cost() {
        Some(c) => format!("{c}"),
        None => "-".into(),
    };
    let path = alignment.path_nodes().iter().join(",");
    format!("{}\t{status}\t{cost}\t{path}", read.comment)
}

/// FASTA or FASTQ by extension; reads with non-ACGT characters are skipped.
fn load_reads(path: &Path) -> Result<Vec<Read>> {
    let file = || -> Result<BufReader<File>> {
        Ok(BufReader::new(
            File::open(path).with_context(|| format!("reading {}", path.display()))?,
        ))
    };
    let raw: Vec<(String, Vec<u8>)> = match path.extension().and_then(|e| e.to_str()) {
        Some("fa" | "fasta" | "fna") => bio::io::fasta::Reader::new(file()?)
            .records()
            .map(|r| -> Result<_> {
                let r = r?;
                Ok((r.id().to_owned(), r.seq().to_ascii_uppercase()))
            })
            .collect::<Result<_>>()?,
        Some("fq" | "fastq") => bio::io::fastq::Reader::new(file()?)
            .records()
            .map(|r| -> Result<_> {
                let r = r?;
                Ok((r.id().to_owned(), r.seq().to_ascii_uppercase()))
            })
            .collect::<Result<_>>()?,
        _ => bail!(
            "unknown query extension for {}; expected fa/fasta/fna/fq/fastq",
            path.display()
        ),
    };

    Ok(raw
        .into_iter()
        .filter(|(id, seq)| {
            let ok = !seq.is_empty() && seq.iter().all(|&c| is_nucl(c));
            if !ok {
                warn!("skipping read {id}: empty or non-ACGT");
            }
            ok
        })
        .map(|(id, seq)| Read::new(id, seq))
        .collect())
}
