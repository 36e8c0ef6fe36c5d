//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board). Rules are kept apart from
//! board storage so the status transition can be read in one place.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{check_winner, has_winning_line_through};
