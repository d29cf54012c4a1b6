use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vcsn")]
#[command(about = "Normalize, generate and compile vcsn specializations")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging, and full toolchain output in errors
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Plugin directory (overrides $VCSN_PLUGINDIR)
	#[arg(long, global = true, value_name = "DIR")]
	pub plugindir: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print the short and full names of a context or type
	Normalize {
		/// Parse as any type name rather than as a context
		#[arg(long = "type")]
		is_type: bool,
		text: String,
	},
	/// Print the source generated for an operation or a context
	Generate {
		/// Generate the instantiation module of context NAME
		#[arg(long)]
		context: bool,
		/// Operation (or context) name
		name: String,
		/// Argument types of the operation
		types: Vec<String>,
	},
	/// Build and load the module implementing an operation
	Compile { operation: String, types: Vec<String> },
	/// Build and load the instantiation module of a context
	CompileContext { context: String },
	/// List declared operations and generated modules
	List,
}
