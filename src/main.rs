//! Tictactoe - command-line front end.
//!
//! Registers users, starts games and plays moves against a SQLite file.

#![warn(missing_docs)]

mod cli;

use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, UserCommand};
use tictactoe::{
    AppConfig, GameId, GameRecord, GameRepository, GameService, PlayerId, ServiceError, User,
};
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?.with_database_override(cli.database);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(database = %config.database_path(), "Starting tictactoe");

    let repo = GameRepository::new(config.database_path().clone())?;
    let applied = repo.run_migrations()?;
    let service = GameService::new(repo);

    match cli.command {
        Command::Migrate => {
            println!("Applied {} migration(s)", applied);
            Ok(())
        }
        Command::User { action } => run_user(&service, action),
        Command::New { first, second } => run_new(&service, &first, &second),
        Command::Show { game, viewer, json } => run_show(&service, GameId(game), viewer, json),
        Command::Move {
            game,
            player,
            x,
            y,
            comment,
        } => run_move(&service, GameId(game), &player, x, y, comment),
        Command::Games { user, active } => run_games(&service, &user, active),
        Command::List => {
            let games = service.all_games().map_err(reject)?;
            print_games(&service, &games)
        }
    }
}

/// Turns a service error into a message naming its class.
fn reject(err: ServiceError) -> anyhow::Error {
    anyhow::anyhow!("{} error: {}", err.kind(), err)
}

fn find_user(service: &GameService<GameRepository>, username: &str) -> Result<User> {
    service
        .store()
        .get_user_by_name(username)?
        .with_context(|| format!("User '{}' not found", username))
}

fn usernames(service: &GameService<GameRepository>) -> Result<HashMap<PlayerId, String>> {
    Ok(service
        .store()
        .list_users()?
        .into_iter()
        .map(|u| (u.player_id(), u.username().clone()))
        .collect())
}

fn name_of(names: &HashMap<PlayerId, String>, player: PlayerId) -> String {
    names
        .get(&player)
        .cloned()
        .unwrap_or_else(|| format!("#{}", player))
}

#[instrument(skip(service))]
fn run_user(service: &GameService<GameRepository>, action: UserCommand) -> Result<()> {
    match action {
        UserCommand::Add { username } => {
            let user = service.store().create_user(username)?;
            println!("Created user {} ({})", user.username(), user.id());
        }
        UserCommand::List => {
            for user in service.store().list_users()? {
                println!("{:>4}  {}", user.id(), user.username());
            }
        }
    }
    Ok(())
}

#[instrument(skip(service))]
fn run_new(service: &GameService<GameRepository>, first: &str, second: &str) -> Result<()> {
    let first = find_user(service, first)?;
    let second = find_user(service, second)?;
    let record = service
        .create_game(first.player_id(), second.player_id())
        .map_err(reject)?;
    println!(
        "Game {}: {} vs {}",
        record.id(),
        first.username(),
        second.username()
    );
    Ok(())
}

#[instrument(skip(service))]
fn run_show(
    service: &GameService<GameRepository>,
    id: GameId,
    viewer: Option<String>,
    json: bool,
) -> Result<()> {
    let viewer = viewer.map(|name| find_user(service, &name)).transpose()?;
    let view = service
        .game_view(id, viewer.as_ref().map(User::player_id))
        .map_err(reject)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let names = usernames(service)?;
    println!("Game {}: {}", id, view.label(|p| name_of(&names, p)));
    println!("Status: {}", view.record().status());
    println!();
    println!("{}", view.board().display());
    if !view.moves().is_empty() {
        println!();
        for (n, mv) in view.moves().iter().enumerate() {
            let player = view.player_on(mv.side());
            if mv.comment().is_empty() {
                println!("{:>2}. {} {}", n + 1, name_of(&names, player), mv.position());
            } else {
                println!(
                    "{:>2}. {} {}  \"{}\"",
                    n + 1,
                    name_of(&names, player),
                    mv.position(),
                    mv.comment()
                );
            }
        }
    }
    if let Some(viewer) = viewer {
        println!();
        if *view.viewer_can_move() {
            println!("Your move, {}.", viewer.username());
        } else {
            println!("Not {}'s turn.", viewer.username());
        }
    }
    Ok(())
}

#[instrument(skip(service, comment))]
fn run_move(
    service: &GameService<GameRepository>,
    id: GameId,
    player: &str,
    x: i32,
    y: i32,
    comment: String,
) -> Result<()> {
    let player = find_user(service, player)?;
    let outcome = service
        .make_move(id, player.player_id(), x, y, comment)
        .map_err(reject)?;
    debug!(status = ?outcome.status(), "Move stored");
    println!("{} played {}", player.username(), outcome.accepted().position());
    println!("Status: {}", outcome.status());
    Ok(())
}

#[instrument(skip(service))]
fn run_games(service: &GameService<GameRepository>, username: &str, active: bool) -> Result<()> {
    let user = find_user(service, username)?;
    let games = service
        .games_for_user(user.player_id(), active)
        .map_err(reject)?;
    if games.is_empty() {
        println!("No games for {}", user.username());
        return Ok(());
    }
    print_games(service, &games)
}

fn print_games(service: &GameService<GameRepository>, games: &[GameRecord]) -> Result<()> {
    let names = usernames(service)?;
    for game in games {
        println!(
            "{:>4}  {} vs {}  [{}]  {}",
            game.id(),
            name_of(&names, *game.first_player()),
            name_of(&names, *game.second_player()),
            game.status().code(),
            game.status()
        );
    }
    Ok(())
}
