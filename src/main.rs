//! Rapport CLI binary entry point.

use clap::Parser;
use rapport::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify => commands::handle_verify().await,
        Commands::Usage => commands::handle_usage().await,
        Commands::Chat(args) => commands::handle_chat(args).await,
        Commands::Greet(args) => commands::handle_greet(args.instructions).await,
        Commands::Rewrite(args) => commands::handle_rewrite(&args.text, args.instructions).await,
        Commands::Sort(args) => commands::handle_sort(args).await,
        Commands::Engage(args) => commands::handle_engage(args.instructions).await,
        Commands::Context(args) => commands::handle_context(args.command),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
