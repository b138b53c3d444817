use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rcss")]
#[command(about = "Rusty Style Sheets compiler")]
#[command(version)]
pub struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a stylesheet to plain CSS.
    Build {
        /// Source file, or `-` for stdin.
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print nested rules as written.
        #[arg(long)]
        no_flatten: bool,
        /// Leave `Context` and `@at-root` nodes and empty rules in place.
        #[arg(long)]
        keep_context: bool,
    },
    /// Print rules that apply exactly when the input's conditions do not.
    Negate {
        /// Source file, or `-` for stdin.
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Dump the parsed syntax tree as JSON.
    Ast {
        /// Source file, or `-` for stdin.
        input: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}
