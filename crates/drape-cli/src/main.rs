//! drape: run cloth scenarios and inspect cached frames.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "drape")]
#[command(version, about = "drape: spring-network cloth with k-DOP collision")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a hanging sheet, or a sheet dropped on a sphere.
    Simulate {
        /// Simulation config (TOML). Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 50)]
        frames: u32,

        /// Cloth grid columns.
        #[arg(long, default_value_t = 20)]
        cols: usize,

        /// Cloth grid rows.
        #[arg(long, default_value_t = 20)]
        rows: usize,

        /// Drop the cloth onto a sphere instead of hanging it.
        #[arg(long)]
        sphere: bool,

        /// Write the last frame's snapshot to this file.
        #[arg(short, long)]
        save: Option<String>,
    },

    /// Run the canonical scenarios and report metrics as CSV.
    Benchmark {
        /// hanging_sheet, sphere_drape, self_fold or all.
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Decode a frame snapshot written by `simulate --save`.
    Inspect {
        /// Path to snapshot file.
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            config,
            frames,
            cols,
            rows,
            sphere,
            save,
        } => commands::simulate(&commands::SimulateArgs {
            config: config.as_deref(),
            frames,
            cols,
            rows,
            sphere,
            save: save.as_deref(),
        }),
        Commands::Benchmark { scenario, output } => commands::benchmark(&scenario, output.as_deref()),
        Commands::Inspect { path } => commands::inspect(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
