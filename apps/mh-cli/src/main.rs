use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use mh_abi::{ComponentModel, NativeModel};
use mh_host::{Adapter, Arena, DEFAULT_CAPACITY, HostBridge, Manifest};

mod error;
mod run;
mod scenario;

use error::CliResult;
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "mh-cli")]
#[command(about = "Component-model host driver - load, inspect and run IEEE/CIGRE DLL models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a manifest and list its instances
    Validate {
        /// Path to the manifest (e.g. icdll_list.txt)
        manifest_path: PathBuf,
        /// Arena capacity
        #[arg(long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
    },
    /// Bind a model library and print its metadata
    Inspect {
        /// Path to the shared library
        library: PathBuf,
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
        /// Also call the model's own Model_PrintInfo
        #[arg(long)]
        print_info: bool,
    },
    /// Run a scenario and write outputs as CSV
    Run {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Host log on stderr, so CSV on stdout stays clean.
struct ConsoleBridge;

impl HostBridge for ConsoleBridge {
    fn append_log(&mut self, text: &str) {
        eprintln!("{text}");
    }

    fn abort(&mut self, reason: &str) {
        eprintln!("Stopping simulation due to error: {reason}");
    }
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            manifest_path,
            capacity,
        } => cmd_validate(&manifest_path, capacity),
        Commands::Inspect {
            library,
            json,
            print_info,
        } => cmd_inspect(&library, json, print_info),
        Commands::Run {
            scenario_path,
            output,
        } => cmd_run(&scenario_path, output.as_deref()),
    }
}

fn cmd_validate(manifest_path: &Path, capacity: usize) -> CliResult<()> {
    println!("Validating manifest: {}", manifest_path.display());
    let manifest = Manifest::read(manifest_path, capacity)?;
    let arena = Arena::from_manifest(&manifest, capacity)?;

    if arena.is_empty() {
        println!("No instances declared");
    } else {
        println!("Instances:");
        for instance in arena.iter() {
            println!("  {} : {}", instance.id().index(), instance.library().display());
        }
    }
    if let Some(verbosity) = manifest.verbosity {
        println!("Verbosity: {}", verbosity.level());
    }
    println!("✓ Manifest is valid");
    Ok(())
}

fn cmd_inspect(library: &Path, json: bool, print_info: bool) -> CliResult<()> {
    let mut model = NativeModel::load(library)?;

    if json {
        println!("{}", serde_json::to_string_pretty(model.metadata())?);
    } else {
        println!("Library: {}", library.display());
        println!("{}", model.metadata());
        let absent = model.capabilities().absent();
        if !absent.is_empty() {
            let names: Vec<&str> = absent.iter().map(|e| e.symbol()).collect();
            println!("Not exported: {}", names.join(", "));
        }
    }

    if print_info {
        io::stdout().flush()?;
        match model.print_info() {
            Some(code) => println!("Model_PrintInfo returned {code}"),
            None => println!("Model_PrintInfo is not exported"),
        }
    }
    Ok(())
}

fn cmd_run(scenario_path: &Path, output: Option<&Path>) -> CliResult<()> {
    let scenario = Scenario::load(scenario_path)?;
    eprintln!(
        "Running {} instance(s): host step = {} s, stop time = {} s",
        scenario.instances.len(),
        scenario.host_step,
        scenario.stop_time
    );

    let mut adapter = Adapter::native(scenario.host_config(), ConsoleBridge);
    let rows = match output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            let rows = run::run(&scenario, &mut adapter, &mut out)?;
            out.flush()?;
            eprintln!("✓ Wrote {rows} rows to {}", path.display());
            rows
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run::run(&scenario, &mut adapter, &mut out)?
        }
    };
    tracing::debug!(rows, "scenario complete");
    Ok(())
}
