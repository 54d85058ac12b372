//! Command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// toolrelay - let a language model answer with tools from MCP servers
#[derive(Parser, Debug)]
#[command(name = "toolrelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the user config)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a prompt, calling tools as needed
    Ask {
        prompt: String,

        /// Approve every flagged tool without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// List the tools of every configured server
    Tools,

    /// Manage which tools need confirmation
    Approval {
        #[command(subcommand)]
        command: ApprovalCommands,
    },

    /// Manage configured tool servers
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ApprovalCommands {
    /// Require confirmation for server.tool
    Set { tool: String },
    /// Remove the preference for server.tool
    Unset { tool: String },
    /// Show stored preferences
    List,
}

#[derive(Subcommand, Debug)]
pub enum ServerCommands {
    /// Add a server reached over HTTP or a Unix socket
    Add {
        name: String,
        #[arg(long, conflicts_with = "socket", required_unless_present = "socket")]
        url: Option<String>,
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Remove a server
    Remove { name: String },
    /// Show configured servers
    List,
}
