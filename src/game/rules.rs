use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{Board, Mark, CELL_COUNT};

/// 八条获胜连线：先行、再列、最后对角线。
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("the game already has a winner")]
    GameFinished,
    #[error("cell {index} is already occupied")]
    CellOccupied { index: usize },
    #[error("cell {index} is outside the board")]
    CellOutOfRange { index: usize },
    #[error("step {step} is outside history of length {len}")]
    StepOutOfRange { step: usize, len: usize },
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
}

/// 当前棋盘的对局结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    InProgress,
    Won { winner: Mark, line: [usize; 3] },
    Draw,
}

/// First complete line in [`LINES`] order.
pub fn winning_line(board: &Board) -> Option<[usize; 3]> {
    let cells = board.cells();
    LINES.iter().copied().find(|&[a, b, c]| {
        let mark = cells[a];
        !mark.is_empty() && mark == cells[b] && mark == cells[c]
    })
}

/// 返回占据某条完整连线的一方；没有则返回 `Mark::Empty`。
pub fn evaluate_winner(board: &Board) -> Mark {
    winning_line(board)
        .map(|[a, _, _]| board.cells()[a])
        .unwrap_or(Mark::Empty)
}

pub fn is_full(board: &Board) -> bool {
    board.occupied_count() == CELL_COUNT
}

pub fn is_draw(board: &Board) -> bool {
    is_full(board) && evaluate_winner(board).is_empty()
}

pub fn outcome(board: &Board) -> Outcome {
    if let Some(line) = winning_line(board) {
        return Outcome::Won {
            winner: board.cells()[line[0]],
            line,
        };
    }
    if is_draw(board) {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

/// 判断能否在 `index` 落子。
pub fn check_move(board: &Board, index: usize) -> Result<(), RuleError> {
    let mark = board
        .get(index)
        .ok_or(RuleError::CellOutOfRange { index })?;
    if !evaluate_winner(board).is_empty() {
        return Err(RuleError::GameFinished);
    }
    if !mark.is_empty() {
        return Err(RuleError::CellOccupied { index });
    }
    Ok(())
}
