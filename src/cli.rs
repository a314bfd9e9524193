// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "railyard")]
#[command(about = "Dependency-ordered deployment orchestration for Railway projects")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (only final results)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON-lines output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new railyard.yml configuration file
    Init {
        /// Project id to write into the template
        #[arg(short, long)]
        project: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Verify CLI connectivity and authentication
    Health,

    /// Show configured services and their recorded status
    Status,

    /// Deploy a single service
    Deploy {
        /// Service name from railyard.yml
        service: String,
    },

    /// Deploy every service in dependency order
    DeployAll,

    /// Redeploy a service's latest build
    Redeploy { service: String },

    /// Restart a service without creating a deployment
    Restart { service: String },

    /// Roll a service back to an earlier deployment
    Rollback {
        service: String,
        /// Ledger id of the deployment to restore
        deployment_id: String,
    },

    /// Show recorded deployment history for a service
    History { service: String },

    /// Manage service variables (names only; values are never printed)
    Variables {
        #[command(subcommand)]
        action: VariablesAction,
    },
}

#[derive(Subcommand)]
pub enum VariablesAction {
    /// List variable names for a service
    List { service: String },

    /// Set KEY=VALUE pairs on a service
    Set {
        service: String,
        /// One or more KEY=VALUE pairs
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Delete a variable from a service
    Delete { service: String, name: String },
}
