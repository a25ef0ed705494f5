use accuflow_api::engine::EngineKind;
use accuflow_api::graph::GraphStore;
use accuflow_common::config::{Configuration, EngineOptions};
use accuflow_runtime::algorithms::scc::strongly_connected_components;
use accuflow_runtime::algorithms::sssp::single_source_shortest_paths;
use accuflow_runtime::engine::run_program;
use accuflow_runtime::graph::InMemoryGraph;
use accuflow_runtime::io::file::{read_edges_csv, read_edges_jsonl, read_vertices_jsonl};
use accuflow_runtime::observability::init_tracing;
use clap::{Parser, ValueEnum};
use serde_json::Value as JsonValue;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Algorithm {
    Sssp,
    Scc,
}

#[derive(Debug, Parser)]
struct Args {
    /// Vertex documents, JSON lines with an `_id` field.
    #[arg(long)]
    vertices: String,

    /// Edge documents: JSON lines with `_from`/`_to`, or a `from,to,weight`
    /// CSV when the path ends in `.csv`.
    #[arg(long)]
    edges: String,

    /// Built-in program to run; mutually exclusive with --program.
    #[arg(long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Path to a program descriptor JSON file.
    #[arg(long)]
    program: Option<String>,

    #[arg(long, default_value = "air")]
    engine: String,

    #[arg(long, default_value = "result")]
    result_field: String,

    /// Start vertex id for sssp.
    #[arg(long)]
    start_vertex: Option<String>,

    /// Edge attribute holding the traversal cost.
    #[arg(long, default_value = "weight")]
    weight_attribute: String,

    /// Override the descriptor's superstep limit.
    #[arg(long)]
    max_gss: Option<u64>,

    /// Print the descriptor and exit without running it.
    #[arg(long)]
    dry_run: bool,

    /// Halt with partial results instead of failing when the superstep
    /// limit is reached.
    #[arg(long)]
    best_effort: bool,
}

fn build_descriptor(args: &Args) -> Result<JsonValue, Box<dyn std::error::Error>> {
    let mut descriptor = match (&args.program, args.algorithm) {
        (Some(path), None) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        (None, Some(Algorithm::Sssp)) => {
            let start = args
                .start_vertex
                .as_deref()
                .ok_or("--start-vertex is required for sssp")?;
            single_source_shortest_paths(&args.result_field, start, &args.weight_attribute)
        }
        (None, Some(Algorithm::Scc)) => strongly_connected_components(&args.result_field),
        _ => return Err("exactly one of --program or --algorithm is required".into()),
    };

    if let Some(max_gss) = args.max_gss {
        descriptor["maxGSS"] = JsonValue::from(max_gss);
    }
    Ok(descriptor)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing();

    let kind: EngineKind = args.engine.parse()?;
    let descriptor = build_descriptor(&args)?;
    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    let vertices = read_vertices_jsonl(&args.vertices)?;
    let edges = if args.edges.ends_with(".csv") {
        read_edges_csv(&args.edges, &args.weight_attribute)?
    } else {
        read_edges_jsonl(&args.edges)?
    };
    let graph = InMemoryGraph::new(vertices, edges);

    let mut config = Configuration::new();
    if args.best_effort {
        config.put("runtime.deadline_best_effort", "true");
    }
    let options = EngineOptions::from_config(&config);

    let (graph, result) = run_program(kind, graph, &descriptor, &options)?;

    let mut vertices: Vec<_> = graph.vertices().to_vec();
    vertices.sort_by(|a, b| a.id.cmp(&b.id));
    for vertex in vertices {
        println!("{}", serde_json::to_string(&vertex)?);
    }
    eprintln!(
        "halted after {} superstep(s){}",
        result.supersteps,
        if result.deadline_hit {
            " (superstep limit reached)"
        } else {
            ""
        }
    );
    Ok(())
}
