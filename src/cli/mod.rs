//! Command-line interface for Rapport.

pub mod commands;

use clap::{Parser, Subcommand};

/// Rapport CLI
#[derive(Parser, Debug)]
#[command(name = "rapport", version, about = "Talk to a Rapport agent from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the API key against the service
    Verify,
    /// Show the remaining quota
    Usage,
    /// Send a message
    Chat(ChatArgs),
    /// Ask for an opening line
    Greet(InstructionArgs),
    /// Rewrite text in the agent's voice
    Rewrite(RewriteArgs),
    /// Sort items by relevance to the user
    Sort(SortArgs),
    /// Ask whether the agent should engage the user
    Engage(InstructionArgs),
    /// Manage the persisted context
    Context(ContextArgs),
}

/// Arguments for `rapport chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Wait for the full reply instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Send the saved context with the message
    #[arg(long)]
    pub context: bool,

    /// Message text
    pub prompt: String,
}

/// Optional instructions shared by several commands.
#[derive(Parser, Debug)]
pub struct InstructionArgs {
    #[arg(short, long)]
    pub instructions: Option<String>,
}

/// Arguments for `rapport rewrite`.
#[derive(Parser, Debug)]
pub struct RewriteArgs {
    pub text: String,

    #[arg(short, long)]
    pub instructions: Option<String>,
}

/// Arguments for `rapport sort`.
#[derive(Parser, Debug)]
pub struct SortArgs {
    #[arg(required = true)]
    pub items: Vec<String>,

    #[arg(short, long)]
    pub instructions: Option<String>,
}

/// Arguments for the `context` subcommand group.
#[derive(Parser, Debug)]
pub struct ContextArgs {
    #[command(subcommand)]
    pub command: ContextCommands,
}

#[derive(Subcommand, Debug)]
pub enum ContextCommands {
    /// Record something about the user
    Add { content: String },
    /// Show saved entries
    List,
    /// Forget every entry
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chat_defaults_to_streaming() {
        let cli = Cli::try_parse_from(["rapport", "chat", "hello"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert!(!args.no_stream);
                assert!(!args.context);
                assert_eq!(args.prompt, "hello");
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_flags() {
        let cli =
            Cli::try_parse_from(["rapport", "chat", "--no-stream", "--context", "hi"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert!(args.no_stream);
                assert!(args.context);
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_sort_collects_items() {
        let cli =
            Cli::try_parse_from(["rapport", "sort", "a", "b", "c", "-i", "cheapest first"]).unwrap();
        match cli.command {
            Commands::Sort(args) => {
                assert_eq!(args.items, vec!["a", "b", "c"]);
                assert_eq!(args.instructions.as_deref(), Some("cheapest first"));
            }
            other => panic!("expected Sort, got {other:?}"),
        }
    }

    #[test]
    fn parse_context_add() {
        let cli = Cli::try_parse_from(["rapport", "context", "add", "likes tea"]).unwrap();
        match cli.command {
            Commands::Context(args) => match args.command {
                ContextCommands::Add { content } => assert_eq!(content, "likes tea"),
                other => panic!("expected Add, got {other:?}"),
            },
            other => panic!("expected Context, got {other:?}"),
        }
    }

    #[test]
    fn parse_engage_without_instructions() {
        let cli = Cli::try_parse_from(["rapport", "engage"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Engage(InstructionArgs { instructions: None })
        ));
    }

    #[test]
    fn parse_sort_without_items_is_error() {
        assert!(Cli::try_parse_from(["rapport", "sort"]).is_err());
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["rapport"]).is_err());
    }
}
