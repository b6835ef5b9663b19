//! point-to-point — street routing demo on a synthetic Turin grid.
//!
//! Builds the grid, round-trips it through the binary network format,
//! answers a batch of point-to-point queries and prints a few diagnostics.
//!
//! ```text
//! point-to-point [config.json] [queries.csv]
//! ```
//!
//! `config.json` overrides any [`QueryConfig`] field; `queries.csv` replaces
//! the embedded query set.  Set `RUST_LOG=debug` to see per-search logs.

mod network;

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use sr_network::diagnostics;
use sr_network::{
    PlanOutcome, PlanRequest, Planner, QueryConfig, TransportNetwork, load_requests_csv,
    load_requests_reader,
};

use network::{COLS, ROWS, build_network};

const TIME_ZONE: &str = "Europe/Rome";

// mode,from,to across the grid.  The last row starts far outside it.
const QUERIES_CSV: &str = "\
mode,from_lat,from_lon,to_lat,to_lon,full_trace\n\
walk,45.06050,7.66070,45.07950,7.68650,false\n\
bike,45.06050,7.66070,45.07950,7.68650,false\n\
car,45.06050,7.66070,45.07950,7.68650,false\n\
walk,45.06110,7.66160,45.06220,7.66160,true\n\
car,45.07000,7.67000,45.06300,7.66500,\n\
bicycle,45.20000,7.90000,45.07000,7.67000,\n\
";

fn load_config(path: Option<&String>) -> Result<QueryConfig> {
    let Some(path) = path else {
        return Ok(QueryConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn load_requests(path: Option<&String>) -> Result<Vec<PlanRequest>> {
    Ok(match path {
        Some(path) => load_requests_csv(Path::new(path))?,
        None => load_requests_reader(Cursor::new(QUERIES_CSV))?,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();

    println!("=== point-to-point — street routing ===");
    println!("Grid: {ROWS} × {COLS}  |  Time zone: {TIME_ZONE}");
    println!();

    // 1. Configuration.
    let config = load_config(args.first())?;
    println!(
        "Config: radius {} m, result cap {} edges, start {} ms",
        config.radius_meters, config.max_result_edges, config.start_time_ms
    );

    // 2. Build the network.
    let t0 = Instant::now();
    let (layer, _vertices) = build_network()?;
    let built = TransportNetwork::new(layer).with_time_zone(TIME_ZONE);
    println!(
        "Street layer: {} vertices, {} edges, built in {:.3} s",
        built.streets().vertex_count(),
        built.streets().edge_count(),
        t0.elapsed().as_secs_f64()
    );

    // 3. Round-trip through the binary format.
    let path = std::env::temp_dir().join("point-to-point.srnet");
    built.write_to_path(&path)?;
    let t0 = Instant::now();
    let network = TransportNetwork::read_from_path(&path)?;
    let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    println!(
        "Persisted to {} ({} bytes), reloaded in {:.3} s",
        path.display(),
        bytes,
        t0.elapsed().as_secs_f64()
    );
    println!();

    // 4. Plan.
    let requests = load_requests(args.get(1))?;
    info!("planning {} queries", requests.len());
    let planner = Planner::new(&network, config);
    let t0 = Instant::now();
    let outcomes = planner.plan_batch(&requests);
    let elapsed = t0.elapsed();

    println!(
        "{:<4} {:<5} {:<20} {:>10} {:>10} {:>6} {:>8}",
        "#", "Mode", "Outcome", "Weight", "Secs", "Steps", "Settled"
    );
    println!("{}", "-".repeat(70));
    for (i, (request, outcome)) in requests.iter().zip(&outcomes).enumerate() {
        let outcome = match outcome {
            Ok(o) => o,
            Err(e) => {
                println!("{:<4} {:<5} error: {e}", i, request.mode);
                continue;
            }
        };
        match outcome {
            PlanOutcome::Found { path, .. } => println!(
                "{:<4} {:<5} {:<20} {:>10.1} {:>10.1} {:>6} {:>8}",
                i,
                request.mode,
                "found",
                path.weight,
                path.duration_ms as f64 / 1_000.0,
                path.steps.len(),
                path.settled
            ),
            PlanOutcome::Unreachable { origin, .. } => println!(
                "{:<4} {:<5} {:<20} (origin on edge {}, {} + {} outgoing)",
                i,
                request.mode,
                "unreachable",
                origin.split.edge.0,
                origin.vertex0.outgoing.len(),
                origin.vertex1.outgoing.len()
            ),
            PlanOutcome::OriginNotFound => {
                println!("{:<4} {:<5} {:<20}", i, request.mode, "origin not found")
            }
            PlanOutcome::DestinationNotFound => {
                println!("{:<4} {:<5} {:<20}", i, request.mode, "destination not found")
            }
        }
        if let Some(trace) = outcome.trace() {
            println!("     trace: {} events", trace.len());
        }
    }
    println!("Planned {} queries in {:.3} s", requests.len(), elapsed.as_secs_f64());
    println!();

    let first = outcomes.iter().filter_map(|o| o.as_ref().ok()).find_map(PlanOutcome::path);
    if let Some(path) = first {
        println!("First path:");
        println!("{}", serde_json::to_string_pretty(path)?);
        println!();
    }

    // 5. Diagnostics.
    println!("Metadata: {}", serde_json::to_string(&diagnostics::metadata(planner.network()))?);
    println!("Query config: {}", serde_json::to_string(planner.config())?);
    println!("Flag usage: {}", serde_json::to_string(&planner.flag_usage(None)?)?);
    println!("Speeds: {}", serde_json::to_string(&planner.speed_histogram(None)?)?);
    if let Some(env) = network.envelope() {
        let report = planner.street_edges(&env, false)?;
        let one_way = report.edges.iter().filter(|e| e.one_way).count();
        println!(
            "Street edges: {} forward, {} one-way, {} flagged vertices",
            report.edges.len(),
            one_way,
            report.vertices.len()
        );
    }

    Ok(())
}
