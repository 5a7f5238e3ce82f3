//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros. Besides `serve`, the commands cover the
//! administration the HTTP API does not expose: issuing API tokens and
//! setting the app's author.

pub mod admin;
pub mod models;
pub mod workspace;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Agent-aware chat server.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true, env = "PARLEY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Port to listen on (defaults to `server.port` from config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` from config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// List the models the server can route turns to.
    Models,

    /// Manage API tokens.
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },

    /// Read or set app-wide settings such as the author.
    #[command(name = "app-info")]
    AppInfo {
        #[command(subcommand)]
        action: AppInfoCommand,
    },

    /// Manage workspaces for a user.
    Workspace {
        #[command(subcommand)]
        action: WorkspaceCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Issue a token for a user. The token is printed once.
    Create {
        /// User id the token authenticates as.
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum AppInfoCommand {
    /// Print a value.
    Get {
        /// Setting key (e.g. `author`).
        key: String,
    },
    /// Set a value.
    Set {
        /// Setting key (e.g. `author`).
        key: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// Create a workspace owned by a user.
    Create {
        #[arg(long)]
        user: String,
        name: String,
    },
    /// List a user's workspaces.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        user: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_token_create() {
        let cli = Cli::parse_from(["parley", "token", "create", "--user", "u1"]);
        assert!(matches!(
            cli.command,
            Commands::Token { action: TokenCommand::Create { ref user } } if user == "u1"
        ));
    }

    #[test]
    fn test_parse_app_info_set() {
        let cli = Cli::parse_from(["parley", "--json", "app-info", "set", "author", "Ada"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::AppInfo { action: AppInfoCommand::Set { ref key, ref value } }
                if key == "author" && value == "Ada"
        ));
    }
}
