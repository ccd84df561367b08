//! txdecode CLI - decode, hash and check signed transaction envelopes.

use clap::{Parser, Subcommand};

mod commands;
mod input;
mod logging;
mod output;
mod schema;

use commands::{check, decode, hash};
use input::InputFormat;
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "txdecode")]
#[command(about = "Decode and validate signed transaction envelopes")]
struct Cli {
    /// Diagnostic log format on stderr (filter with RUST_LOG)
    #[arg(long, value_enum, global = true, default_value = "pretty")]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the verified transaction
    Decode {
        /// Input file (or stdin if not provided)
        input: Option<String>,
        /// Schema document listing message descriptors
        #[arg(long)]
        schema: String,
        /// Decoder limits as JSON
        #[arg(long)]
        config: Option<String>,
        /// Encoding of the input
        #[arg(long, value_enum, default_value = "hex")]
        format: InputFormat,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the hash of a canonical envelope without decoding its contents
    Hash {
        /// Input file (or stdin if not provided)
        input: Option<String>,
        /// Encoding of the input
        #[arg(long, value_enum, default_value = "hex")]
        format: InputFormat,
    },
    /// Check that an envelope is canonically encoded
    Check {
        /// Input file (or stdin if not provided)
        input: Option<String>,
        /// Encoding of the input
        #[arg(long, value_enum, default_value = "hex")]
        format: InputFormat,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let result = match cli.command {
        Commands::Decode {
            input,
            schema,
            config,
            format,
            json,
        } => decode::run(input, schema, config, format, json),
        Commands::Hash { input, format } => hash::run(input, format),
        Commands::Check { input, format } => check::run(input, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
