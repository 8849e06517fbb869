mod commands;
mod machine;

use clap::{Parser, Subcommand};
use commands::create::CreateArgs;
use commands::power::PowerAction;
use lwmachine_driver::{MachineStore, STORAGE_PATH_ENV};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lwmachine")]
#[command(about = "Create and manage Docker hosts on Liquid Web", long_about = None)]
struct Cli {
    /// Directory holding machine records and keys (default: ~/.lwmachine)
    #[arg(short = 's', long, env = STORAGE_PATH_ENV, global = true)]
    storage_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'D', long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a machine
    Create(CreateArgs),
    /// Start a machine
    Start {
        /// Machine name
        name: String,
    },
    /// Gracefully stop a machine
    Stop {
        /// Machine name
        name: String,
    },
    /// Reboot a machine
    Restart {
        /// Machine name
        name: String,
    },
    /// Force a machine to power off
    Kill {
        /// Machine name
        name: String,
    },
    /// Destroy a machine and delete its local record
    Rm {
        /// Machine name
        name: String,
        /// Delete the local record even if the remote destroy fails
        #[arg(short, long)]
        force: bool,
    },
    /// Show the state of a machine
    Status {
        /// Machine name
        name: String,
    },
    /// Show the primary IP of a machine
    Ip {
        /// Machine name
        name: String,
    },
    /// Show the Docker URL of a machine
    Url {
        /// Machine name
        name: String,
    },
    /// List machines
    Ls,
    /// Show the options accepted by `create`
    Flags,
    /// Show version information
    Version,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug);

    // These never touch the store
    match cli.command {
        Commands::Version => {
            println!("lwmachine {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Flags => {
            commands::flags::handle();
            return Ok(());
        }
        _ => {}
    }

    let root = match cli.storage_path {
        Some(path) => path,
        None => MachineStore::default_root()?,
    };
    let store = MachineStore::new(root);
    tracing::debug!("Using store {}", store.root().display());

    match cli.command {
        Commands::Create(args) => commands::create::handle(&store, args).await,
        Commands::Start { name } => commands::power::handle(&store, &name, PowerAction::Start).await,
        Commands::Stop { name } => commands::power::handle(&store, &name, PowerAction::Stop).await,
        Commands::Restart { name } => {
            commands::power::handle(&store, &name, PowerAction::Restart).await
        }
        Commands::Kill { name } => commands::power::handle(&store, &name, PowerAction::Kill).await,
        Commands::Rm { name, force } => commands::rm::handle(&store, &name, force).await,
        Commands::Status { name } => commands::inspect::status(&store, &name).await,
        Commands::Ip { name } => commands::inspect::ip(&store, &name).await,
        Commands::Url { name } => commands::inspect::url(&store, &name).await,
        Commands::Ls => commands::ls::handle(&store).await,
        Commands::Flags | Commands::Version => {
            unreachable!("Flags and Version are handled before opening the store");
        }
    }
}
