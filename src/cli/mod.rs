//! CLI module - Command-line interface for the portal
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// PTCAO Portal - Batangas tourism portal sign-in service
#[derive(Parser)]
#[command(name = "ptcao-portal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage registered accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List registered accounts
    #[command(alias = "ls")]
    List {
        /// Only show accounts waiting for approval
        #[arg(long)]
        pending: bool,
    },
    /// Approve an account so it can log in
    Activate {
        /// Account email
        email: String,
    },
    /// Block an account from logging in
    Deactivate {
        /// Account email
        email: String,
    },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["ptcao-portal"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_user_commands() {
        let cli = Cli::try_parse_from(["ptcao-portal", "users", "list", "--pending"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Users {
                command: UserCommands::List { pending: true }
            })
        ));

        let cli =
            Cli::try_parse_from(["ptcao-portal", "users", "activate", "mto@example.com"]).unwrap();
        match cli.command {
            Some(Commands::Users {
                command: UserCommands::Activate { email },
            }) => assert_eq!(email, "mto@example.com"),
            _ => panic!("expected users activate"),
        }
    }

    #[test]
    fn activate_requires_email() {
        assert!(Cli::try_parse_from(["ptcao-portal", "users", "activate"]).is_err());
    }
}
