//! `ot` -- OnTask personalization engine CLI.
//!
//! Parses CLI arguments with clap, loads the configuration, and dispatches
//! to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    let cli = Cli::parse();

    let result = RuntimeContext::from_global_args(&cli.global).and_then(|ctx| {
        // RUST_LOG overrides both --verbose and the configured filter.
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(ctx.log_filter()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();

        match cli.command {
            Some(Commands::Translate(args)) => commands::translate::run(&ctx, &args),
            Some(Commands::Formula(args)) => commands::formula::run(&ctx, &args),
            Some(Commands::Run(args)) => commands::run::run(&ctx, &args),
            Some(Commands::Preview(args)) => commands::preview::run(&ctx, &args),
            Some(Commands::Count(args)) => commands::count::run(&ctx, &args),
            None => {
                // No subcommand -- print help
                use clap::CommandFactory;
                Cli::command().print_help().ok();
                println!();
                Ok(())
            }
        }
    });

    // Handle errors: print message and exit with code 1
    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
