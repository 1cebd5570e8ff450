//! Automated proofreading pass over a graph file.
//!
//! Loads a RAG, reviews every edge inside the priority window in scheduler
//! order, decides by comparing the stored weight against a cutoff, and
//! reports the session statistics. Useful for exercising a graph end to
//! end without an interactive consumer.
//!
//! Usage:
//!   cargo run --release -p agglo-proof --bin proofread -- \
//!     --graph graph.json --min 0.0 --max 1.0 --start 0.5

use agglo_proof::SessionScheduler;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "proofread")]
#[command(about = "Review RAG edges in priority order and report statistics")]
struct Args {
    /// Path to the graph file
    #[arg(short, long)]
    graph: PathBuf,

    /// Lower bound of the review window
    #[arg(long, default_value_t = 0.0)]
    min: f64,

    /// Upper bound of the review window
    #[arg(long, default_value_t = 1.0)]
    max: f64,

    /// Review cursor: edges closest to this weight come first
    #[arg(long, default_value_t = 0.5)]
    start: f64,

    /// Merge edges whose weight is at or below this cutoff
    #[arg(long, default_value_t = 0.5)]
    decide: f64,

    /// Write the reviewed graph here
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut scheduler =
        SessionScheduler::from_graph_file(&args.graph, args.min, args.max, args.start)?;
    let (min, max, start) = scheduler.bounds();
    println!(
        "loaded {} nodes, {} edges; window [{}, {}] cursor {}",
        scheduler.rag().node_count(),
        scheduler.rag().edge_count(),
        min,
        max,
        start
    );

    let mut reviewed = 0usize;
    let mut merged = 0usize;
    while let Some((u, v, location)) = scheduler.get_top_edge() {
        let weight = scheduler
            .rag()
            .find_edge(u, v)
            .map(|e| e.weight)
            .unwrap_or(0.0);
        let merge = weight <= args.decide;
        log::debug!(
            "edge ({}, {}) at {:?}: weight {:.3} -> {}",
            u,
            v,
            location,
            weight,
            if merge { "merge" } else { "keep" }
        );
        scheduler.remove_edge((u, v), merge)?;
        reviewed += 1;
        if merge {
            merged += 1;
        }
    }

    println!(
        "reviewed {} edges ({} merged); {} nodes remain",
        reviewed,
        merged,
        scheduler.rag().node_count()
    );
    println!(
        "average prediction error {:.4}, prediction correct {:.1}%",
        scheduler.average_prediction_error(),
        scheduler.percent_prediction_correct()
    );

    if let Some(path) = &args.export {
        scheduler.export(path)?;
        println!("graph written to {}", path.display());
    }

    Ok(())
}
