use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the wire record a component would post to its host.
    Encode(EncodeArgs),
    /// Feed raw host messages (NDJSON) through a channel and print render events.
    Replay(ReplayArgs),
    /// Decode component records (NDJSON) as a host receives them.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub message: EncodeMessage,
    /// Root element scroll height used when the height is auto-measured.
    #[arg(long, value_name = "PX", global = true)]
    pub root_height: Option<f64>,
    /// Body scroll height used when the height is auto-measured.
    #[arg(long, value_name = "PX", global = true)]
    pub body_height: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum EncodeMessage {
    /// Ready announcement.
    Ready,
    /// Frame height. Omitted, non-numeric or non-positive values are measured.
    Height {
        #[arg(allow_negative_numbers = true)]
        height: Option<String>,
    },
    /// Component value given as JSON.
    Value {
        #[arg(allow_negative_numbers = true)]
        json: String,
    },
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// NDJSON file of raw inbound messages (stdin when omitted).
    pub file: Option<PathBuf>,
    /// Schema directory for render argument validation.
    #[arg(long, value_name = "DIR")]
    pub validate: Option<PathBuf>,
    /// Stop after N render events.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// NDJSON file of outbound records (stdin when omitted).
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open an NDJSON source: the file when given, stdin otherwise.
pub(crate) fn open_input(path: Option<&Path>) -> CliResult<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}
