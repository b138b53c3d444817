mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rcss_core::{flatten_nesting, negate_rules, optimize_ast, parse, to_css};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            output,
            no_flatten,
            keep_context,
        } => {
            let src = read_input(&input)?;
            let mut ast = parse(&src)?;
            if !no_flatten {
                flatten_nesting(&mut ast);
            }
            if !keep_context {
                ast = optimize_ast(ast);
            }
            write_output(output.as_deref(), &to_css(&ast))?;
        }
        Commands::Negate { input, output } => {
            let src = read_input(&input)?;
            let negated = negate_rules(&parse(&src)?)?;
            write_output(output.as_deref(), &to_css(&negated))?;
        }
        Commands::Ast { input, pretty } => {
            let ast = parse(&read_input(&input)?)?;
            let json = if pretty {
                serde_json::to_string_pretty(&ast)?
            } else {
                serde_json::to_string(&ast)?
            };
            write_output(None, &format!("{}\n", json))?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut src = String::new();
        io::stdin()
            .read_to_string(&mut src)
            .context("failed to read stdin")?;
        return Ok(src);
    }
    info!(path = %input.display(), "reading stylesheet");
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn write_output(output: Option<&Path>, css: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, css)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = css.len(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(css.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
