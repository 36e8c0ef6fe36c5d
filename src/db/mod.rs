//! SQLite persistence for users, games and moves.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::User;
pub use repository::GameRepository;
