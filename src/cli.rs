//! Command-line interface for tictactoe.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tic-tac-toe - two-player games stored in SQLite
#[derive(Parser, Debug)]
#[command(name = "tictactoe")]
#[command(about = "Play tic-tac-toe between registered users", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (default: tictactoe.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database file, overriding config and environment
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or upgrade the database schema
    Migrate,

    /// Manage users
    User {
        /// User action
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Start a game; the first user moves first
    New {
        /// Username of the first player (X)
        first: String,

        /// Username of the second player (O)
        second: String,
    },

    /// Show a game's board and moves
    Show {
        /// Game id
        game: i32,

        /// Username viewing the game, to report whether they may move
        #[arg(long = "as")]
        viewer: Option<String>,

        /// Print the game as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a move
    Move {
        /// Game id
        game: i32,

        /// Username of the player moving
        #[arg(long = "as")]
        player: String,

        /// Column, 0-2
        #[arg(allow_negative_numbers = true)]
        x: i32,

        /// Row, 0-2
        #[arg(allow_negative_numbers = true)]
        y: i32,

        /// Comment attached to the move
        #[arg(short, long, default_value = "")]
        comment: String,
    },

    /// List a user's games
    Games {
        /// Username
        user: String,

        /// Only games still in progress
        #[arg(long)]
        active: bool,
    },

    /// List every game
    List,
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user
    Add {
        /// Unique username
        username: String,
    },

    /// List registered users
    List,
}
