use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "snipzip")]
#[command(about = "Extract code snippets from LLM chat text into a ZIP archive", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Resolve and report without writing archives")]
    dry_run: bool,

    #[arg(long, global = true, value_name = "PATH", help = "Conventions file (defaults to snipzip.yml)")]
    conventions: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Extract code blocks into a ZIP archive")]
    Extract {
        #[arg(required = true, help = "Chat text files to read, '-' for stdin")]
        inputs: Vec<String>,

        #[arg(short, long, help = "Archive path, or output directory for several inputs")]
        output: Option<PathBuf>,
    },

    #[command(about = "List the code blocks detected in a chat text")]
    Scan {
        #[arg(help = "Chat text file to read, '-' for stdin")]
        input: String,

        #[arg(long, help = "Emit JSON")]
        json: bool,
    },

    #[command(about = "Print the project layout described in a chat text")]
    Manifest {
        #[arg(help = "Chat text file to read, '-' for stdin")]
        input: String,

        #[arg(long, help = "Emit JSON")]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = cli::logger::setup_logger(cli.verbose) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
        conventions: cli.conventions,
    };

    match cli.command {
        Commands::Extract { inputs, output } => {
            cli::extract(inputs, output, &config)?;
        }
        Commands::Scan { input, json } => {
            cli::scan(&input, json, &config)?;
        }
        Commands::Manifest { input, json } => {
            cli::manifest(&input, json, &config)?;
        }
    }

    Ok(())
}
