//! Handlers for each CLI command.

use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::storage::FileStorage;
use crate::store::relative_time;
use crate::types::{now_millis, MessageOptions, StreamEvent};

use super::{ChatArgs, ContextCommands, SortArgs};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Agent configured from the environment, persisting context on disk.
fn configure() -> Result<AgentConfig, Box<dyn std::error::Error>> {
    Ok(AgentConfig::from_env()?.with_storage(Arc::new(FileStorage::new_default())))
}

async fn connect() -> Result<Agent, Box<dyn std::error::Error>> {
    Ok(Agent::connect(configure()?).await?)
}

/// Handle `rapport verify`.
pub async fn handle_verify() -> CliResult {
    connect().await?;
    println!("API key is valid");
    Ok(())
}

/// Handle `rapport usage`.
pub async fn handle_usage() -> CliResult {
    let agent = connect().await?;
    let usage = agent.usage();
    let show = |n: Option<i64>| n.map_or_else(|| "unknown".to_string(), |n| n.to_string());
    println!("messages: {}", show(usage.messages));
    println!("sorts:    {}", show(usage.sorts));
    println!("rewrites: {}", show(usage.rewrites));
    Ok(())
}

/// Handle `rapport chat`.
pub async fn handle_chat(args: ChatArgs) -> CliResult {
    let agent = connect().await?;
    let options = MessageOptions::builder().use_context(args.context).build();

    if args.no_stream {
        println!("{}", agent.message(&args.prompt, options).await?);
        return Ok(());
    }

    let mut stream = agent.message_stream(&args.prompt, options).await?;
    while let Some(event) = stream.next().await {
        if let StreamEvent::Fragment(text) = event? {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    }
    println!();
    Ok(())
}

/// Handle `rapport greet`.
pub async fn handle_greet(instructions: Option<String>) -> CliResult {
    let agent = connect().await?;
    let reply = agent
        .greet(instructions.as_deref(), MessageOptions::default())
        .await?;
    println!("{reply}");
    Ok(())
}

/// Handle `rapport rewrite`.
pub async fn handle_rewrite(text: &str, instructions: Option<String>) -> CliResult {
    let agent = connect().await?;
    println!("{}", agent.rewrite(text, instructions.as_deref(), true).await?);
    Ok(())
}

/// Handle `rapport sort`.
pub async fn handle_sort(args: SortArgs) -> CliResult {
    let agent = connect().await?;
    let result = agent
        .sort(&args.items, args.instructions.as_deref(), true)
        .await?;
    for item in &result.array {
        println!("{item}");
    }
    if let Some(reasoning) = result.reasoning {
        eprintln!("\n{reasoning}");
    }
    Ok(())
}

/// Handle `rapport engage`.
pub async fn handle_engage(instructions: Option<String>) -> CliResult {
    let agent = connect().await?;
    let decision = agent.should_engage(instructions.as_deref()).await?;
    println!("{}", if decision.should_engage { "engage" } else { "wait" });
    if !decision.reasoning.is_empty() {
        println!("{}", decision.reasoning);
    }
    Ok(())
}

/// Handle `rapport context <add|list|clear>`. Works offline.
pub fn handle_context(command: ContextCommands) -> CliResult {
    let agent = Agent::new(configure()?)?;
    let context = agent.context();
    match command {
        ContextCommands::Add { content } => {
            let index = context.add(&content, None)?;
            println!("Saved entry {index}");
        }
        ContextCommands::List => {
            let now = now_millis();
            for (i, entry) in context.entries().iter().enumerate() {
                println!("{i}: {} ({})", entry.content, relative_time(now - entry.timestamp));
            }
        }
        ContextCommands::Clear => {
            context.clear();
            println!("Context cleared");
        }
    }
    Ok(())
}
