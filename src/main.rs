mod crossing;
mod demo;
mod report;

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use bridgesim::design::Design;
use bridgesim::store::{self, FileStore, DESIGN_KEY};
use bridgesim::{DesignError, Material, SimulationConfig};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crossing::run_crossing;
use demo::demo_design;
use report::{render_materials, render_summary};

const TUTORIAL: &str = "Tip: place joints between the banks, connect them with beams and \
keep each beam within its material's span (see `bridgesim materials`). Heavier loads score \
more but strain the bridge harder.";

#[derive(Parser)]
#[command(name = "bridgesim", version)]
#[command(about = "Build a bridge and send a vehicle across it")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a crossing and print what happened.
    Run(RunArgs),
    /// List the available materials.
    Materials,
    /// Write the demonstration truss as a design file.
    SaveDemo {
        /// Where to write the design.
        path: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Design file to cross; the demonstration truss when omitted.
    #[arg(long)]
    design: Option<PathBuf>,
    /// Material whose cost is scored.
    #[arg(long)]
    material: Option<String>,
    /// Vehicle load weight, clamped to 20..=100.
    #[arg(long)]
    load: Option<f64>,
    /// Simulation configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many seconds of session time.
    #[arg(long, default_value_t = 60.0)]
    max_seconds: f64,
    /// Key-value store keeping the best score and the last design.
    #[arg(long)]
    store: Option<PathBuf>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::default(),
    };
    let design: Design = match &args.design {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => demo_design(),
    };

    let mut bridge = design.build(&config.layout)?;
    if let Some(name) = &args.material {
        let material =
            Material::by_name(name).ok_or_else(|| DesignError::UnknownMaterial(name.clone()))?;
        bridge.select_material(material)?;
    }
    if let Some(load) = args.load {
        let stored = bridge.set_load_weight(load)?;
        if stored != load {
            warn!(requested = load, stored, "load weight clamped");
        }
    }

    let summary = run_crossing(&mut bridge, &config, args.max_seconds)?;
    println!("{}", render_summary(&summary));

    if let Some(path) = &args.store {
        let mut store = FileStore::open(path)?;
        if !store::has_seen_tutorial(&store) {
            println!("{TUTORIAL}");
            store::mark_tutorial_seen(&mut store)?;
        }
        store::save(&mut store, DESIGN_KEY, &Design::capture(&bridge))?;
        if summary.outcome.is_some() {
            let best = store::record_best_score(&mut store, summary.score)?;
            info!(best, path = %store.path().display(), "store updated");
            println!("Best score: {best}");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Run(args) => run(args)?,
        Command::Materials => println!("{}", render_materials()),
        Command::SaveDemo { path } => {
            fs::write(&path, serde_json::to_string_pretty(&demo_design())?)?;
            info!(path = %path.display(), "demo design written");
        }
    }
    Ok(())
}
