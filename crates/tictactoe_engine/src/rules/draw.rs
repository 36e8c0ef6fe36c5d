//! Draw detection logic for tic-tac-toe.

use crate::board::Board;
use crate::types::CELL_COUNT;

/// Checks if every square holds a mark.
///
/// A move that fills the board without completing a line ends the game in
/// a draw. Wins are checked first.
pub fn is_full(board: &Board) -> bool {
    board.occupied_count() == CELL_COUNT
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Move;
    use crate::rules::win::check_winner;
    use crate::types::{Position, Side};

    fn is_draw(board: &Board) -> bool {
        is_full(board) && check_winner(board).is_none()
    }

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_draw_detection() {
        // X O X / X O O / O X X
        let layout = [
            (Side::First, 0, 0),
            (Side::Second, 1, 0),
            (Side::First, 2, 0),
            (Side::First, 0, 1),
            (Side::Second, 1, 1),
            (Side::Second, 2, 1),
            (Side::Second, 0, 2),
            (Side::First, 1, 2),
            (Side::First, 2, 2),
        ];
        let moves: Vec<_> = layout
            .iter()
            .map(|&(side, x, y)| Move::new(side, Position::new(x, y).unwrap()))
            .collect();
        let board = Board::build(&moves).unwrap();
        assert!(is_draw(&board));

        let short = Board::build(&moves[..8]).unwrap();
        assert!(!is_full(&short));
    }
}
