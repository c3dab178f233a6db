//! Command-line tool for hiding and extracting messages within the
//! colourmap of GIF images.
//!
//! ```bash
//! # Conceal a message, compressed and encrypted
//! gifweave -C -p secret -m "attack at dawn" cover.gif out.gif
//!
//! # Extract it again
//! gifweave -C -p secret out.gif
//!
//! # How much will fit?
//! gifweave -S cover.gif
//! ```
//!
//! Without `-f` or `-m` the tool extracts. Omitted file arguments default
//! to stdin and stdout.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use gifweave::{Concealer, Options, capacity};
use log::error;

#[derive(Parser)]
#[command(name = "gifweave")]
#[command(version)]
#[command(about = "Conceal and extract messages in the colourmap ordering of GIF images")]
struct Cli {
	/// Compress the message with the built-in text code
	#[arg(short = 'C')]
	compress: bool,

	/// Suppress warnings and space-usage reports
	#[arg(short = 'Q')]
	quiet: bool,

	/// Report the storage capacity of the input file and exit
	#[arg(short = 'S')]
	space: bool,

	/// Order colours without the password (gifshuffle 1.0 compatibility)
	#[arg(short = '1')]
	legacy_order: bool,

	/// Password protecting the message
	#[arg(short = 'p', value_name = "PASSWD")]
	password: Option<String>,

	/// Conceal the contents of this file
	#[arg(short = 'f', value_name = "FILE", conflicts_with = "message")]
	message_file: Option<PathBuf>,

	/// Conceal this message string
	#[arg(short = 'm', value_name = "MESSAGE")]
	message: Option<String>,

	/// Input GIF (stdin when omitted)
	infile: Option<PathBuf>,

	/// Output file (stdout when omitted)
	outfile: Option<PathBuf>,
}

fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Read>> {
	match path {
		Some(path) => {
			let file = File::open(path).with_context(|| path.display().to_string())?;
			Ok(Box::new(BufReader::new(file)))
		}
		None => Ok(Box::new(std::io::stdin().lock())),
	}
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
	match path {
		Some(path) => {
			let file = File::create(path).with_context(|| path.display().to_string())?;
			Ok(Box::new(BufWriter::new(file)))
		}
		None => Ok(Box::new(std::io::stdout().lock())),
	}
}

fn run(cli: &Cli) -> anyhow::Result<()> {
	let mut input = open_input(cli.infile.as_ref())?;

	if cli.space {
		let capacity = capacity(&mut input)?;
		println!("{capacity}");
		return Ok(());
	}

	let options = Options {
		compress: cli.compress,
		legacy_order: cli.legacy_order,
	};
	let concealer = Concealer::new(options, cli.password.as_deref());
	let mut output = open_output(cli.outfile.as_ref())?;

	if let Some(message) = &cli.message {
		concealer.embed(&mut message.as_bytes(), &mut input, &mut output)?;
	} else if let Some(path) = &cli.message_file {
		let file = File::open(path).with_context(|| path.display().to_string())?;
		let mut message = BufReader::new(file);
		concealer.embed(&mut message, &mut input, &mut output)?;
	} else {
		concealer.extract(&mut input, &mut output)?;
	}

	output.flush()?;
	Ok(())
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	// -Q drops warnings and reports; RUST_LOG still overrides
	let default_level = if cli.quiet { "error" } else { "info" };
	env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_level));

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{e:#}");
			ExitCode::FAILURE
		}
	}
}
