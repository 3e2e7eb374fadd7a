//! Voronoi diagram CLI
//!
//! Builds a clipped Voronoi diagram from a site list and exports it as SVG
//! or PNG, or compares the two construction algorithms.
//!
//! ## Site sources
//!
//!   voronoi -i points.txt -o out.svg
//!   voronoi --random 200 --seed 7 -o out.png --show-sites
//!   voronoi --scene scene.yaml --algorithm sweep
//!
//! A site file holds one `x,y` pair per line; blank lines and `#` comments
//! are skipped.
//!
//! ## YAML scene file
//!
//! ```yaml
//! sites:            # inline sites, or `sites_file: points.txt`, or `random: 100`
//!   - [0, 0]
//!   - [4, 0]
//!   - [2, 3]
//! seed: 0
//! margin: 5
//! bounds: [-10, -10, 20, 20]   # min_x, min_y, max_x, max_y
//! algorithm: delaunay
//! attribution: adjacency
//! width: 800
//! height: 600
//! show_sites: true
//! ```
//!
//! Command-line flags override scene values.
//!
//! ## Benchmark
//!
//! `--benchmark` times both algorithms over several site counts and reports
//! how far apart their Voronoi vertices land. Press Ctrl+C to stop early and
//! print the sizes finished so far.

mod export;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use voronoi_core::{
    load_sites, vertex_discrepancy, Attribution, BoundingBox, DelaunayBackend, Diagram,
    DiagramConfig, Position, SiteCollection, SweepBackend, VoronoiComputer, DEFAULT_MARGIN,
};

/// Random sites are drawn from this square, starting at the origin
const RANDOM_EXTENT: f64 = 20.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Svg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Algorithm {
    /// Bowyer-Watson triangulation, then its dual
    Delaunay,
    /// Fortune's sweep line
    Sweep,
}

/// YAML scene file format
#[derive(Debug, Default, Deserialize)]
struct Scene {
    #[serde(default)]
    sites: Vec<[f64; 2]>,
    /// Site file, relative to the scene file
    #[serde(default)]
    sites_file: Option<PathBuf>,
    #[serde(default)]
    random: Option<usize>,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    margin: Option<f64>,
    #[serde(default)]
    bounds: Option<[f64; 4]>,
    #[serde(default)]
    algorithm: Option<Algorithm>,
    #[serde(default)]
    attribution: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    show_sites: Option<bool>,
}

fn load_scene(path: &PathBuf) -> anyhow::Result<Scene> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse scene file: {:?}", path))
}

#[derive(Parser, Debug)]
#[command(name = "voronoi")]
#[command(about = "Build planar Voronoi diagrams", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Site file: one `x,y` pair per line
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Generate this many random sites instead of reading a file
    #[arg(long)]
    random: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// YAML scene file (sites, viewport and rendering options)
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Construction algorithm
    #[arg(short, long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Output file path (prints a summary only when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from the output extension, else svg)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Padding around the sites' extent
    #[arg(long)]
    margin: Option<f64>,

    /// Explicit viewport: min_x,min_y,max_x,max_y
    #[arg(long, value_delimiter = ',', num_args = 4, allow_hyphen_values = true)]
    bounds: Option<Vec<f64>>,

    /// Cell attribution: adjacency | nearest
    #[arg(long)]
    attribution: Option<String>,

    /// Drawing width in pixels, excluding the border
    #[arg(long)]
    width: Option<u32>,

    /// Drawing height in pixels, excluding the border
    #[arg(long)]
    height: Option<u32>,

    /// Draw site positions
    #[arg(long)]
    show_sites: bool,

    /// Compare both algorithms over several site counts
    #[arg(long)]
    benchmark: bool,

    /// Site counts for benchmark mode
    #[arg(long, value_delimiter = ',', default_value = "100,200,400,800,1600")]
    bench_sizes: Vec<usize>,

    /// Timed runs per algorithm and size in benchmark mode
    #[arg(long, default_value = "3")]
    bench_runs: usize,
}

/// Pick the site source: CLI file, CLI random, then whatever the scene names.
fn resolve_sites(
    args: &Args,
    scene: &Scene,
    scene_dir: &Path,
    seed: u64,
) -> anyhow::Result<Vec<Position>> {
    if let Some(path) = &args.input {
        return load_sites(path).with_context(|| format!("failed to load sites: {:?}", path));
    }
    if let Some(count) = args.random.or(scene.random) {
        return Ok(random_sites(count, seed));
    }
    if let Some(file) = &scene.sites_file {
        let path = scene_dir.join(file);
        return load_sites(&path).with_context(|| format!("failed to load sites: {:?}", path));
    }
    if !scene.sites.is_empty() {
        return Ok(scene.sites.iter().map(|&[x, y]| Position::new(x, y)).collect());
    }
    anyhow::bail!("no sites given: use -i/--input, --random or a scene file with sites")
}

fn random_sites(count: usize, seed: u64) -> Vec<Position> {
    SiteCollection::random(
        count,
        Position::new(0.0, 0.0),
        Position::new(RANDOM_EXTENT, RANDOM_EXTENT),
        seed,
    )
    .sites
}

/// Build the diagram config from scene values and CLI overrides.
fn resolve_config(args: &Args, scene: &Scene) -> anyhow::Result<DiagramConfig> {
    let attribution = match args.attribution.as_ref().or(scene.attribution.as_ref()) {
        Some(name) => name.parse::<Attribution>().map_err(|e| anyhow::anyhow!(e))?,
        None => Attribution::default(),
    };
    let mut config = DiagramConfig::default()
        .with_margin(args.margin.or(scene.margin).unwrap_or(DEFAULT_MARGIN))
        .with_attribution(attribution);

    let bounds = match args.bounds.as_deref() {
        Some(&[min_x, min_y, max_x, max_y]) => Some([min_x, min_y, max_x, max_y]),
        Some(other) => anyhow::bail!("--bounds takes 4 values, got {}", other.len()),
        None => scene.bounds,
    };
    if let Some([min_x, min_y, max_x, max_y]) = bounds {
        let bbox = BoundingBox::new(min_x, min_y, max_x, max_y).context("invalid bounds")?;
        config = config.with_bounds(bbox);
    }
    config.validate()?;
    Ok(config)
}

fn compute(
    algorithm: Algorithm,
    config: DiagramConfig,
    sites: &[Position],
) -> voronoi_core::Result<Diagram> {
    match algorithm {
        Algorithm::Delaunay => {
            VoronoiComputer::with_config(DelaunayBackend::new(), config).compute(sites)
        }
        Algorithm::Sweep => {
            VoronoiComputer::with_config(SweepBackend::new(), config).compute(sites)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scene = args.scene.as_ref().map(load_scene).transpose()?.unwrap_or_default();
    let scene_dir = args
        .scene
        .as_ref()
        .and_then(|p| p.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let seed = args.seed.unwrap_or(scene.seed);
    if let Some(path) = &args.scene {
        log::info!("loaded scene {:?}", path);
    }

    if args.benchmark {
        return run_benchmark(&args, seed);
    }

    let sites = resolve_sites(&args, &scene, &scene_dir, seed)?;
    let config = resolve_config(&args, &scene)?;
    let algorithm = args.algorithm.or(scene.algorithm).unwrap_or(Algorithm::Delaunay);

    println!(
        "Sites: {} (algorithm: {:?}, attribution: {})",
        sites.len(),
        algorithm,
        config.attribution
    );
    let start = Instant::now();
    let diagram = compute(algorithm, config, &sites).context("failed to build diagram")?;
    let elapsed = start.elapsed();

    print_summary(&diagram);
    println!("Computed in {:.2} ms", elapsed.as_secs_f64() * 1000.0);

    let Some(output) = args.output.as_ref() else {
        return Ok(());
    };
    let format = args.format.unwrap_or_else(|| format_from_extension(output));
    log::info!("exporting {:?} to {:?}", format, output);
    let canvas = export::Canvas::new(
        diagram.bounds,
        args.width.or(scene.width).unwrap_or(export::DEFAULT_WIDTH),
        args.height.or(scene.height).unwrap_or(export::DEFAULT_HEIGHT),
    );
    let show_sites = args.show_sites || scene.show_sites.unwrap_or(false);

    match format {
        OutputFormat::Svg => export::write_svg(&diagram, &canvas, show_sites, output)?,
        OutputFormat::Png => export::write_png(&diagram, &canvas, show_sites, output)?,
    }
    println!("Output saved to: {:?}", output);
    Ok(())
}

fn format_from_extension(path: &Path) -> OutputFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => OutputFormat::Png,
        _ => OutputFormat::Svg,
    }
}

fn print_summary(diagram: &Diagram) {
    let b = &diagram.bounds;
    println!("Bounds: [{:.3}, {:.3}] x [{:.3}, {:.3}]", b.min_x, b.max_x, b.min_y, b.max_y);
    match (diagram.degeneracy, diagram.triangles.len()) {
        (Some(degeneracy), 0) => println!("Triangulation: empty ({:?})", degeneracy),
        (Some(degeneracy), n) => println!("Triangles: {} ({:?})", n, degeneracy),
        (None, 0) => {}
        (None, n) => println!("Triangles: {}", n),
    }
    println!("Voronoi vertices: {}", diagram.vertices.len());
    println!("Edges: {} ({} after clipping)", diagram.raw_edges.len(), diagram.edges.len());
    let unrenderable = diagram.unrenderable_sites();
    println!(
        "Cells: {} renderable, {} unrenderable",
        diagram.renderable_cells().count(),
        unrenderable.len()
    );
    if !diagram.duplicates.is_empty() {
        println!("Duplicate sites ignored: {:?}", diagram.duplicates);
    }
}

/// Per-size benchmark results
#[derive(Debug, Default)]
struct BenchRow {
    delaunay_ms: Vec<f64>,
    sweep_ms: Vec<f64>,
    /// Largest vertex mismatch between the two algorithms
    discrepancy: Option<f64>,
}

/// Time both algorithms over increasing site counts
fn run_benchmark(args: &Args, seed: u64) -> anyhow::Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .context("failed to set Ctrl-C handler")?;
    }

    let runs = args.bench_runs.max(1);
    println!("\n=== Voronoi Benchmark ===");
    println!("Sizes: {:?}", args.bench_sizes);
    println!("Runs per algorithm: {}", runs);
    println!("Seed: {}", seed);
    println!();

    let total = (args.bench_sizes.len() * runs * 2) as u64;
    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(concat!(
                "{spinner:.green} [{elapsed_precise}] ",
                "[{bar:40.cyan/blue}] {pos}/{len} ({eta})"
            ))?
            .progress_chars("#>-"),
    );

    let config = DiagramConfig::default();
    let mut rows: BTreeMap<usize, BenchRow> = BTreeMap::new();

    'sizes: for &n in &args.bench_sizes {
        let sites = random_sites(n, seed);
        let row = rows.entry(n).or_default();
        let mut last: [Option<Diagram>; 2] = [None, None];

        for _ in 0..runs {
            let algorithms = [Algorithm::Delaunay, Algorithm::Sweep];
            for (slot, algorithm) in algorithms.into_iter().enumerate() {
                if interrupted.load(Ordering::Relaxed) {
                    progress.abandon_with_message("Interrupted");
                    eprintln!("Interrupted, printing partial results...");
                    break 'sizes;
                }
                let start = Instant::now();
                let diagram = compute(algorithm, config, &sites)?;
                let ms = start.elapsed().as_secs_f64() * 1000.0;
                match algorithm {
                    Algorithm::Delaunay => row.delaunay_ms.push(ms),
                    Algorithm::Sweep => row.sweep_ms.push(ms),
                }
                last[slot] = Some(diagram);
                progress.inc(1);
            }
        }
        if let [Some(dual), Some(sweep)] = &last {
            row.discrepancy =
                vertex_discrepancy(&dual.vertices_in_bounds(), &sweep.vertices_in_bounds());
        }
    }

    if !interrupted.load(Ordering::Relaxed) {
        progress.finish_with_message("Benchmark complete");
    }

    println!("\nTiming by site count:");
    println!(
        "{:>8} {:>12} {:>12} {:>8} {:>12}",
        "sites", "delaunay_ms", "sweep_ms", "ratio", "max_gap"
    );
    for (n, row) in &rows {
        let avg = |times: &[f64]| {
            if times.is_empty() {
                f64::NAN
            } else {
                times.iter().sum::<f64>() / times.len() as f64
            }
        };
        let (d, s) = (avg(&row.delaunay_ms), avg(&row.sweep_ms));
        let gap = row
            .discrepancy
            .map_or_else(|| "-".to_string(), |g| format!("{:.2e}", g));
        println!("{:>8} {:>12.2} {:>12.2} {:>8.2} {:>12}", n, d, s, d / s, gap);
    }
    Ok(())
}
