use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

mod commands;

/// Collate - packages compiled mod projects into .tmod archives
#[derive(Parser)]
#[command(name = "collate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Package a built mod into a .tmod archive
    Package(commands::package::PackageArgs),

    /// Show the header, metadata and entries of an archive
    Inspect {
        /// Path to the .tmod archive
        archive: String,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract every entry of an archive into a directory
    Extract {
        /// Path to the .tmod archive
        archive: String,

        /// Destination directory
        dest: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., packing.compression_level)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let debug = cli.verbose || matches!(&cli.command, Commands::Package(args) if args.debug);
    init_logging(debug);

    let result = match cli.command {
        Commands::Package(args) => commands::package::run(args),
        Commands::Inspect { archive, json } => commands::inspect::run(archive, json),
        Commands::Extract { archive, dest } => commands::extract::run(archive, dest),
        Commands::Config { action } => commands::config::run(&action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "collate", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
