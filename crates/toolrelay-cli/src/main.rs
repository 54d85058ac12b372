use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};

use toolrelay_core::approval::{ApprovalStore, FileApprovalStore};
use toolrelay_core::config::{ConfigProvider, FileConfigProvider, RelayConfig, ServerConfig};
use toolrelay_core::logging::{ConsoleLogger, LogLevel, Logger};
use toolrelay_core::{
    create_provider, ApprovalDecision, ChatOutcome, ConversationLoop, PendingApproval,
    QualifiedName, ToolDirectory,
};

mod cli;

use cli::{ApprovalCommands, Cli, Commands, ServerCommands};

fn logger(cli: &Cli) -> Arc<dyn Logger> {
    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Warn };
    Arc::new(ConsoleLogger::new().with_level(level))
}

fn config_provider(cli: &Cli) -> FileConfigProvider {
    match &cli.config {
        Some(path) => FileConfigProvider::new(path),
        None => FileConfigProvider::user(),
    }
}

fn approval_store(config: &RelayConfig) -> FileApprovalStore {
    match &config.approvals_path {
        Some(path) => FileApprovalStore::new(path),
        None => FileApprovalStore::user(),
    }
}

async fn connect(config: &RelayConfig, logger: Arc<dyn Logger>) -> Arc<ToolDirectory> {
    let directory = ToolDirectory::new(logger).with_call_timeout(config.limits.tool_timeout());
    directory.connect(&config.servers).await;
    Arc::new(directory)
}

/// Ask on the terminal whether a flagged tool may run
fn confirm(pending: &PendingApproval) -> Result<ApprovalDecision> {
    let mut stderr = io::stderr();
    write!(
        stderr,
        "Allow {} with {}? [y/N] ",
        pending.qualified_name(),
        pending.arguments
    )?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(match line.trim().to_lowercase().as_str() {
        "y" | "yes" => ApprovalDecision::Approve,
        _ => ApprovalDecision::Deny,
    })
}

async fn run_ask(config: RelayConfig, prompt: &str, yes: bool, logger: Arc<dyn Logger>) -> Result<()> {
    let directory = connect(&config, Arc::clone(&logger)).await;
    let provider = create_provider(&config.model.provider, Arc::clone(&logger));

    let mut relay = ConversationLoop::new(
        provider,
        config.model.to_model_config(),
        Arc::clone(&directory),
        logger,
    )
    .with_approvals(Arc::new(approval_store(&config)))
    .with_settings(config.limits.clone());
    if let Some(system_prompt) = &config.system_prompt {
        relay = relay.with_system_prompt(system_prompt.clone());
    }

    let result = converse(&relay, prompt, yes).await;
    directory.disconnect_all().await;

    println!("{}", result?);
    Ok(())
}

async fn converse(relay: &ConversationLoop, prompt: &str, yes: bool) -> Result<String> {
    let mut outcome = relay.start_conversation(prompt).await?;
    loop {
        match outcome {
            ChatOutcome::Answer(text) => return Ok(text),
            ChatOutcome::ApprovalRequired(pending) => {
                let decision = if yes {
                    ApprovalDecision::Approve
                } else {
                    confirm(&pending)?
                };
                outcome = relay.resume(pending, decision).await?;
            }
        }
    }
}

async fn run_tools(config: RelayConfig, logger: Arc<dyn Logger>) -> Result<()> {
    let directory = connect(&config, logger).await;
    let servers = directory.server_names();
    let tools = directory.list_all_tools().await;
    directory.disconnect_all().await;

    if servers.is_empty() {
        println!("No tool servers connected");
        return Ok(());
    }
    println!("Servers: {}", servers.join(", "));
    if tools.is_empty() {
        println!("No tools available");
    }
    for tool in tools {
        println!("{:<32} {}", tool.qualified_name(), tool.description);
    }
    Ok(())
}

fn run_approval(config: &RelayConfig, command: &ApprovalCommands) -> Result<()> {
    let store = approval_store(config);
    match command {
        ApprovalCommands::Set { tool } => {
            let target = QualifiedName::parse(tool)?;
            store.set(&target.server, &target.tool, true)?;
            println!("{} now requires approval", target);
        }
        ApprovalCommands::Unset { tool } => {
            let target = QualifiedName::parse(tool)?;
            store.delete(&target.server, &target.tool)?;
            println!("{} no longer requires approval", target);
        }
        ApprovalCommands::List => {
            for record in store.list()? {
                println!(
                    "{}.{}: {}",
                    record.server_name,
                    record.tool_name,
                    if record.requires_approval { "required" } else { "not required" }
                );
            }
        }
    }
    Ok(())
}

async fn run_server(provider: &FileConfigProvider, command: &ServerCommands) -> Result<()> {
    match command {
        ServerCommands::Add { name, url, socket } => {
            let server = match (url, socket) {
                (Some(url), _) => ServerConfig::http(name.clone(), url.clone()),
                (None, Some(socket)) => ServerConfig::unix(name.clone(), socket.clone()),
                (None, None) => eyre::bail!("server '{}' needs --url or --socket", name),
            };
            provider.add_server(server).await?;
            println!("Added server '{}'", name);
        }
        ServerCommands::Remove { name } => {
            provider.remove_server(name).await?;
            println!("Removed server '{}'", name);
        }
        ServerCommands::List => {
            for server in provider.get_servers().await {
                let endpoint = server
                    .endpoint()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "(no endpoint)".to_string());
                let state = if server.enabled { "" } else { " (disabled)" };
                println!("{:<16} {}{}", server.name, endpoint, state);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logger = logger(&cli);
    let provider = config_provider(&cli);
    let config = provider
        .get_config()
        .await
        .wrap_err_with(|| format!("Failed to load config from {}", provider.path().display()))?;

    match &cli.command {
        Commands::Ask { prompt, yes } => run_ask(config, prompt, *yes, logger).await,
        Commands::Tools => run_tools(config, logger).await,
        Commands::Approval { command } => run_approval(&config, command),
        Commands::Server { command } => run_server(&provider, command).await,
    }
}
