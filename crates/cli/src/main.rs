use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use eta::api::*;
use eta::geo::TurnGeometry;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod io;
mod provenance;

use provenance::{write_sidecar, RunRecord};

#[derive(Parser)]
#[command(name = "eta-cli")]
#[command(about = "Best-scoring walk search and experiment runner")]
struct Cmd {
    /// Log search progress (start, improvements, termination)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Search a scored edge list (or a base network's terminal graph) and write the best walk as JSON
    Search(SearchArgs),
    /// Write a random geometric graph as edges/coords CSV
    Gen(GenArgs),
    /// Print a small provenance JSON block
    Report,
}

#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// CSV with columns u,v,score
    #[arg(long, required_unless_present = "network", conflicts_with = "network")]
    edges: Option<PathBuf>,
    /// Base network CSV with columns u,v,length,cost; the search runs on the
    /// terminal graph over --source and --destinations
    #[arg(long, requires = "source")]
    network: Option<PathBuf>,
    /// Nodes the walk must visit in network mode
    #[arg(long, value_delimiter = ',')]
    destinations: Vec<String>,
    /// Terminal edge weight: alpha*length + (1-alpha)*cost
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,
    /// Reject walks whose expanded base path costs more than this
    #[arg(long)]
    cost_limit: Option<f64>,
    /// CSV with columns node,x,y (needed for --turn-limit and --world)
    #[arg(long)]
    coords: Option<PathBuf>,
    /// Treat coords as lon/lat degrees
    #[arg(long)]
    spherical: bool,
    /// Candidate edges to seed from (-1: all)
    #[arg(long, default_value_t = 5000, allow_negative_numbers = true)]
    sn: i64,
    /// Expansion budget (-1: unlimited)
    #[arg(long, default_value_t = 1_000_000, allow_negative_numbers = true)]
    itmax: i64,
    /// Maximum number of sharp turns
    #[arg(long)]
    turn_limit: Option<u32>,
    /// Wall-clock budget in milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,
    /// Report raw score sums instead of normalized objectives
    #[arg(long)]
    raw: bool,
    /// Only consider open walks
    #[arg(long)]
    open_only: bool,
    /// Fail unless there are at least nodeCount (+1) candidate edges
    #[arg(long)]
    strict: bool,
    /// Rotate the walk into a circuit starting and ending here
    #[arg(long)]
    source: Option<String>,
    /// Grid world file (obs/pois/length/width) to project the walk onto
    #[arg(long)]
    world: Option<PathBuf>,
    /// Coordinate units per grid cell
    #[arg(long, default_value_t = 5.0)]
    cell_size: f64,
    /// Output JSON path (stdout if omitted)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct GenArgs {
    #[arg(long, default_value_t = 30)]
    nodes: usize,
    /// Connection radius in the unit square
    #[arg(long, default_value_t = 0.3)]
    radius: f64,
    #[arg(long, default_value_t = 10.0)]
    score_max: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    out_edges: PathBuf,
    #[arg(long)]
    out_coords: PathBuf,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose { Level::DEBUG } else { Level::INFO };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Search(args) => search(args),
        Action::Gen(args) => gen(args),
        Action::Report => report(),
    }
}

#[derive(Debug, Serialize)]
struct WalkReport {
    walk: Vec<String>,
    steps: Option<Vec<String>>,
    objective: f64,
    raw_objective: f64,
    closed: bool,
    termination: String,
    capacity: usize,
    scale: f64,
    stats: Value,
    base_path: Option<Vec<String>>,
    total_length: Option<f64>,
    total_cost: Option<f64>,
    grid: Option<GridReport>,
}

/// Base network and the terminal graph searched in its place.
struct Network {
    base: MetricNetwork<String>,
    terminals: TransformedGraph<String>,
}

#[derive(Debug, Serialize)]
struct GridReport {
    path: Vec<Cell>,
    cost: f64,
}

fn search(args: SearchArgs) -> Result<()> {
    let report = run_search(&args)?;
    let body = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(out, body).with_context(|| format!("writing {}", out.display()))?;
            let record = RunRecord::new("search", search_params(&args))
                .with_input(args.edges.as_deref())
                .with_input(args.network.as_deref())
                .with_input(args.coords.as_deref())
                .with_input(args.world.as_deref());
            let prov = write_sidecar(out, record)?;
            tracing::info!(out = %out.display(), provenance = %prov.display(), "report written");
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn search_params(args: &SearchArgs) -> Value {
    json!({
        "edges": args.edges,
        "network": args.network,
        "destinations": args.destinations,
        "alpha": args.alpha,
        "cost_limit": args.cost_limit,
        "coords": args.coords,
        "spherical": args.spherical,
        "sn": args.sn,
        "itmax": args.itmax,
        "turn_limit": args.turn_limit,
        "time_limit_ms": args.time_limit_ms,
        "raw": args.raw,
        "open_only": args.open_only,
        "source": args.source,
        "world": args.world,
        "cell_size": args.cell_size,
    })
}

fn load_network(path: &Path, args: &SearchArgs) -> Result<Network> {
    let Some(source) = &args.source else {
        bail!("--network needs --source");
    };
    let base = MetricNetwork::from_edges(io::read_network(path)?)
        .with_context(|| format!("building network from {}", path.display()))?;
    let terminals = transformed_graph(&base, source, &args.destinations, args.alpha)?;
    tracing::info!(
        terminals = terminals.terminals().len(),
        edges = terminals.graph().edges().len(),
        alpha = args.alpha,
        "terminal graph ready"
    );
    Ok(Network { base, terminals })
}

fn run_search(args: &SearchArgs) -> Result<WalkReport> {
    let network = args
        .network
        .as_deref()
        .map(|p| load_network(p, args))
        .transpose()?;
    let graph = match (&network, &args.edges) {
        (Some(n), _) => n.terminals.graph().clone(),
        (None, Some(edges)) => ScoredGraph::from_edges(io::read_edges(edges)?)
            .with_context(|| format!("building graph from {}", edges.display()))?,
        (None, None) => bail!("one of --edges or --network is required"),
    };
    let coords = args.coords.as_deref().map(io::read_coords).transpose()?;
    if args.turn_limit.is_some() && coords.is_none() {
        bail!("--turn-limit needs --coords");
    }
    let geometry: Option<Box<dyn TurnGeometry<String>>> = match &coords {
        Some(rows) if args.spherical => {
            Some(Box::new(rows.iter().cloned().collect::<SphericalCoords<String>>()))
        }
        Some(rows) => Some(Box::new(rows.iter().cloned().collect::<PlanarCoords<String>>())),
        None => None,
    };

    let cfg = SearchCfg {
        seed_limit: SeedLimit::from_signed(args.sn)?,
        iteration_limit: IterationLimit::from_signed(args.itmax)?,
        turn: args.turn_limit.map(TurnCfg::with_limit),
        normalize_objective: !args.raw,
        allow_closed_walks: !args.open_only,
        require_full_candidates: args.strict,
        time_limit: args.time_limit_ms.map(Duration::from_millis),
    };
    let outcome = eta_search(&graph, graph.edges(), cfg, geometry.as_deref())?;
    tracing::info!(
        objective = outcome.objective,
        raw_objective = outcome.raw_objective(),
        len = outcome.walk.len(),
        closed = outcome.closed,
        termination = %outcome.termination,
        iterations = outcome.stats.iterations,
        "search done"
    );

    let steps = match &args.source {
        Some(src) => Some(
            rotate_to_source(&outcome.walk, src)
                .with_context(|| format!("source {src} is not on the walk"))?,
        ),
        None => None,
    };

    let (base_path, totals) = match &network {
        Some(n) => {
            let missing = n.terminals.missing_terminals(&outcome.walk);
            if !missing.is_empty() {
                bail!("walk misses destinations {missing:?}");
            }
            let terminal_walk = steps.as_deref().unwrap_or(&outcome.walk);
            let path = n
                .terminals
                .expand(terminal_walk)
                .context("walk uses an edge outside the terminal graph")?;
            let totals = n
                .base
                .totals(&path)
                .context("expanded path leaves the base network")?;
            tracing::info!(
                len = path.len(),
                length = totals.length,
                cost = totals.cost,
                "walk expanded"
            );
            if let Some(limit) = args.cost_limit {
                if totals.cost > limit {
                    bail!("total cost {} exceeds --cost-limit {limit}", totals.cost);
                }
            }
            (Some(path), Some(totals))
        }
        None => (None, None),
    };

    let grid = match &args.world {
        Some(world) => {
            let Some(rows) = &coords else {
                bail!("--world needs --coords");
            };
            let waypoints = base_path
                .as_deref()
                .or(steps.as_deref())
                .unwrap_or(&outcome.walk);
            Some(project(world, rows, args.cell_size, waypoints)?)
        }
        None => None,
    };

    let s = outcome.stats;
    Ok(WalkReport {
        objective: outcome.objective,
        raw_objective: outcome.raw_objective(),
        closed: outcome.closed,
        termination: outcome.termination.to_string(),
        capacity: outcome.capacity,
        scale: outcome.scale,
        stats: json!({
            "iterations": s.iterations,
            "pushed": s.pushed,
            "dead_ends": s.dead_ends,
            "dominated": s.dominated,
            "infeasible": s.infeasible,
            "closures": s.closures,
            "improvements": s.improvements,
            "max_frontier": s.max_frontier,
        }),
        walk: outcome.walk,
        steps,
        base_path,
        total_length: totals.map(|t| t.length),
        total_cost: totals.map(|t| t.cost),
        grid,
    })
}

fn project(
    world: &Path,
    coords: &[(String, f64, f64)],
    cell_size: f64,
    waypoints: &[String],
) -> Result<GridReport> {
    let text =
        std::fs::read_to_string(world).with_context(|| format!("reading {}", world.display()))?;
    let world = GridWorld::parse(&text)?;
    let projector = GridProjector::from_coords(world, coords.iter().cloned(), GridCfg { cell_size });
    let p = projector.project(waypoints)?;
    tracing::info!(cells = p.path.len(), cost = p.cost, "walk projected");
    Ok(GridReport {
        path: p.path,
        cost: p.cost,
    })
}

fn gen(args: GenArgs) -> Result<()> {
    let cfg = RandomGraphCfg {
        nodes: args.nodes,
        radius: args.radius,
        score_max: args.score_max,
        ..RandomGraphCfg::default()
    };
    let rg = random_geometric_graph(cfg, args.seed)?;
    io::write_edges(&args.out_edges, rg.graph.edges())?;
    io::write_coords(&args.out_coords, &rg.points)?;
    tracing::info!(
        nodes = args.nodes,
        edges = rg.graph.edges().len(),
        seed = args.seed,
        "graph written"
    );
    let params = json!({
        "nodes": args.nodes,
        "radius": args.radius,
        "score_max": args.score_max,
        "seed": args.seed,
    });
    write_sidecar(&args.out_edges, RunRecord::new("gen", params).with_output(&args.out_coords))?;
    Ok(())
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "eta_version": eta::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(edges: PathBuf) -> SearchArgs {
        SearchArgs {
            edges: Some(edges),
            network: None,
            destinations: Vec::new(),
            alpha: 1.0,
            cost_limit: None,
            coords: None,
            spherical: false,
            sn: -1,
            itmax: -1,
            turn_limit: None,
            time_limit_ms: None,
            raw: false,
            open_only: false,
            strict: false,
            source: None,
            world: None,
            cell_size: 1.0,
            out: None,
        }
    }

    fn square(dir: &Path) -> PathBuf {
        let p = dir.join("edges.csv");
        fs::write(&p, "u,v,score\nA,B,4\nB,C,3\nC,D,2\nD,A,1\n").unwrap();
        p
    }

    #[test]
    fn search_finds_square_cycle_and_rotates() {
        let dir = tempdir().unwrap();
        let mut a = args(square(dir.path()));
        a.source = Some("C".into());
        let r = run_search(&a).unwrap();
        assert!(r.closed);
        assert!((r.raw_objective - 10.0).abs() < 1e-9);
        let steps = r.steps.unwrap();
        assert_eq!(steps.first().map(String::as_str), Some("C"));
        assert_eq!(steps.last().map(String::as_str), Some("C"));
        assert_eq!(steps.len(), 5);
    }

    #[test]
    fn turn_limit_without_coords_is_rejected() {
        let dir = tempdir().unwrap();
        let mut a = args(square(dir.path()));
        a.turn_limit = Some(1);
        assert!(run_search(&a).is_err());
    }

    #[test]
    fn projects_onto_open_grid() {
        let dir = tempdir().unwrap();
        let edges = dir.path().join("edges.csv");
        fs::write(&edges, "u,v,score\nA,B,5\nB,C,1\n").unwrap();
        let coords = dir.path().join("coords.csv");
        fs::write(&coords, "node,x,y\nA,0,0\nB,2,0\nC,2,2\n").unwrap();
        let world = dir.path().join("world.txt");
        fs::write(&world, "obs\npois\nlength\n4\nwidth\n4\n").unwrap();
        let mut a = args(edges);
        a.coords = Some(coords);
        a.world = Some(world);
        let r = run_search(&a).unwrap();
        assert_eq!(r.walk, vec!["A", "B", "C"]);
        let grid = r.grid.unwrap();
        assert_eq!(grid.path.first(), Some(&(0, 0)));
        assert_eq!(grid.path.last(), Some(&(2, 2)));
        assert!((grid.cost - 4.0).abs() < 1e-9);
    }

    /// S, D1 and D2 all meet at hub M; the direct S-D2 and D1-D2 links are longer.
    fn hub_network(dir: &Path) -> SearchArgs {
        let p = dir.join("net.csv");
        fs::write(
            &p,
            "u,v,length,cost\nS,M,1,1\nM,D1,1,1\nM,D2,1,1\nD1,D2,5,5\nS,D2,3,3\n",
        )
        .unwrap();
        SearchArgs {
            edges: None,
            network: Some(p),
            destinations: vec!["D1".into(), "D2".into()],
            source: Some("S".into()),
            ..args(PathBuf::new())
        }
    }

    #[test]
    fn network_walk_expands_through_hub() {
        let dir = tempdir().unwrap();
        let a = hub_network(dir.path());
        let r = run_search(&a).unwrap();
        assert!(r.closed);
        let steps = r.steps.unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps.first().map(String::as_str), Some("S"));
        assert_eq!(steps.last().map(String::as_str), Some("S"));
        let base = r.base_path.unwrap();
        assert_eq!(base.len(), 7);
        assert_eq!(base.iter().filter(|n| *n == "M").count(), 3);
        assert_eq!(r.total_length, Some(6.0));
        assert_eq!(r.total_cost, Some(6.0));
    }

    #[test]
    fn cost_limit_rejects_expensive_walk() {
        let dir = tempdir().unwrap();
        let mut a = hub_network(dir.path());
        a.cost_limit = Some(5.0);
        let err = run_search(&a).unwrap_err();
        assert!(err.to_string().contains("--cost-limit"));
        a.cost_limit = Some(6.0);
        assert!(run_search(&a).is_ok());
    }

    #[test]
    fn unreachable_destination_fails_coverage() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("net.csv");
        fs::write(&p, "u,v,length,cost\nS,D1,1,1\nD2,X,1,1\n").unwrap();
        let a = SearchArgs {
            edges: None,
            network: Some(p),
            destinations: vec!["D1".into(), "D2".into()],
            source: Some("S".into()),
            ..args(PathBuf::new())
        };
        let err = run_search(&a).unwrap_err();
        assert!(err.to_string().contains("misses destinations"));
    }

    #[test]
    fn search_writes_report_and_sidecar() {
        let dir = tempdir().unwrap();
        let mut a = args(square(dir.path()));
        let out = dir.path().join("runs/walk.json");
        a.out = Some(out.clone());
        search(a).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(parsed["closed"], true);
        let prov = fs::read(dir.path().join("runs/walk.provenance.json")).unwrap();
        let prov: Value = serde_json::from_slice(&prov).unwrap();
        assert_eq!(prov["command"], "search");
        assert_eq!(prov["inputs"], json!([dir.path().join("edges.csv").to_string_lossy()]));
    }
}
