use clap::{Parser, Subcommand};
use lifeforge::commands::config::{self, ConfigAction};
use lifeforge::commands::{install, package};
use lifeforge::common::GlobalOpts;
use lifeforge_logger as logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lifeforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Lifeforge module manager",
    long_about = "Lifeforge is a CLI tool for installing and packaging modules for the Lifeforge host application."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a module archive into the host application
    Install {
        /// Path to the module archive
        archive: PathBuf,
    },
    /// Package a local module into a distributable archive
    Package {
        /// Module name; selected from the route registry when omitted
        module: Option<String>,
        /// Output directory for the archive (default: current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Configure the lifeforge tool
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    let result = match cli.command {
        Commands::Install { archive } => {
            install::handle_install(&archive).map_err(|e| e.to_string())
        }
        Commands::Package { module, out } => {
            package::handle_package(module, out).map_err(|e| e.to_string())
        }
        Commands::Config { action } => config::handle_config(action).map_err(|e| e.to_string()),
    };

    if let Err(message) = result {
        logger::error(&message);
        std::process::exit(1);
    }
}
