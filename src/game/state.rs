use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 棋盘格子数量（3x3）。
pub const CELL_COUNT: usize = 9;

/// 单个格子的占用情况。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mark {
    #[serde(rename = "None")]
    Empty,
    PlayerX,
    PlayerO,
}

impl Default for Mark {
    fn default() -> Self {
        Mark::Empty
    }
}

impl Mark {
    pub fn is_empty(self) -> bool {
        matches!(self, Mark::Empty)
    }

    /// 对手的棋子；空格保持为空。
    pub fn opponent(self) -> Mark {
        match self {
            Mark::PlayerX => Mark::PlayerO,
            Mark::PlayerO => Mark::PlayerX,
            Mark::Empty => Mark::Empty,
        }
    }

    /// 第 `step` 步之后轮到谁落子：偶数步 X，奇数步 O。
    pub fn for_step(step: usize) -> Mark {
        if step % 2 == 0 {
            Mark::PlayerX
        } else {
            Mark::PlayerO
        }
    }

    /// 界面上显示的符号。
    pub fn symbol(self) -> Option<char> {
        match self {
            Mark::PlayerX => Some('X'),
            Mark::PlayerO => Some('O'),
            Mark::Empty => None,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mark::Empty => "None",
            Mark::PlayerX => "PlayerX",
            Mark::PlayerO => "PlayerO",
        };
        f.write_str(label)
    }
}

/// 某一时刻的完整棋盘快照，按行优先编号 0..8。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Board {
    cells: [Mark; CELL_COUNT],
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Mark; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Mark; CELL_COUNT] {
        &self.cells
    }

    /// Out-of-range indices read as `None`.
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied()
    }

    /// 返回落子后的新棋盘，原棋盘不变。
    pub fn with_mark(&self, index: usize, mark: Mark) -> Board {
        let mut next = *self;
        if let Some(cell) = next.cells.get_mut(index) {
            *cell = mark;
        }
        next
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|mark| !mark.is_empty()).count()
    }

    pub fn is_blank(&self) -> bool {
        self.occupied_count() == 0
    }

    /// X 与 O 互换后的棋盘。
    pub fn relabeled(&self) -> Board {
        let mut cells = self.cells;
        for cell in &mut cells {
            *cell = cell.opponent();
        }
        Board { cells }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("history is empty")]
    EmptyHistory,
    #[error("history does not start from an empty board")]
    NonEmptyStart,
    #[error("current step {step} is outside history of length {len}")]
    StepOutOfRange { step: usize, len: usize },
    #[error("step {step} expects {expected} to move next, found {actual}")]
    TurnMismatch {
        step: usize,
        expected: Mark,
        actual: Mark,
    },
    #[error("history entry {step} is not a legal move from the previous board")]
    InvalidTransition { step: usize },
}

/// 反序列化时的原始字段，校验通过后才转成 [`Session`]。
#[derive(Debug, Clone, Deserialize)]
struct RawSession {
    history: Vec<Board>,
    current_step: usize,
    next_mark: Mark,
}

/// 一局游戏的会话状态：历史快照、当前步数以及下一位落子方。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawSession")]
pub struct Session {
    pub(crate) history: Vec<Board>,
    pub(crate) current_step: usize,
    pub(crate) next_mark: Mark,
}

impl Session {
    pub fn new() -> Self {
        Self {
            history: vec![Board::empty()],
            current_step: 0,
            next_mark: Mark::PlayerX,
        }
    }

    pub fn history(&self) -> &[Board] {
        &self.history
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn next_mark(&self) -> Mark {
        self.next_mark
    }

    pub fn current_board(&self) -> Board {
        // sessions are only built by `new`, the controller, or validated deserialization
        self.history[self.current_step]
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let first = self.history.first().ok_or(IntegrityError::EmptyHistory)?;
        if !first.is_blank() {
            return Err(IntegrityError::NonEmptyStart);
        }

        if self.current_step >= self.history.len() {
            return Err(IntegrityError::StepOutOfRange {
                step: self.current_step,
                len: self.history.len(),
            });
        }

        let expected = Mark::for_step(self.current_step);
        if self.next_mark != expected {
            return Err(IntegrityError::TurnMismatch {
                step: self.current_step,
                expected,
                actual: self.next_mark,
            });
        }

        for (offset, pair) in self.history.windows(2).enumerate() {
            let step = offset + 1;
            let (before, after) = (&pair[0], &pair[1]);
            if !super::rules::evaluate_winner(before).is_empty() {
                return Err(IntegrityError::InvalidTransition { step });
            }

            let placed = Mark::for_step(offset);
            let mut changed = before
                .cells()
                .iter()
                .zip(after.cells().iter())
                .filter(|(old, new)| old != new);
            let legal = match (changed.next(), changed.next()) {
                (Some((old, new)), None) => old.is_empty() && *new == placed,
                _ => false,
            };
            if !legal {
                return Err(IntegrityError::InvalidTransition { step });
            }
        }

        Ok(())
    }
}

impl TryFrom<RawSession> for Session {
    type Error = IntegrityError;

    fn try_from(raw: RawSession) -> Result<Self, Self::Error> {
        let session = Session {
            history: raw.history,
            current_step: raw.current_step,
            next_mark: raw.next_mark,
        };
        session.integrity_check()?;
        Ok(session)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(layout: &str) -> Board {
        let mut cells = [Mark::Empty; CELL_COUNT];
        for (cell, ch) in cells.iter_mut().zip(layout.chars()) {
            *cell = match ch {
                'X' => Mark::PlayerX,
                'O' => Mark::PlayerO,
                _ => Mark::Empty,
            };
        }
        Board::from_cells(cells)
    }

    #[test]
    fn new_session_starts_empty_with_x() {
        let session = Session::new();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.current_step(), 0);
        assert_eq!(session.next_mark(), Mark::PlayerX);
        assert!(session.current_board().is_blank());
        assert!(session.integrity_check().is_ok());
    }

    #[test]
    fn with_mark_leaves_original_untouched() {
        let original = Board::empty();
        let next = original.with_mark(4, Mark::PlayerX);
        assert!(original.is_blank(), "source board must not change");
        assert_eq!(next.get(4), Some(Mark::PlayerX));
        assert_eq!(next.occupied_count(), 1);
    }

    #[test]
    fn symbol_and_display_per_mark() {
        assert_eq!(Mark::PlayerX.symbol(), Some('X'));
        assert_eq!(Mark::PlayerO.symbol(), Some('O'));
        assert_eq!(Mark::Empty.symbol(), None);
        assert_eq!(Mark::PlayerO.to_string(), "PlayerO");
        assert_eq!(Mark::Empty.to_string(), "None");
    }

    #[test]
    fn mark_serializes_empty_as_none() {
        let json = serde_json::to_string(&board("X O")).expect("board should serialize");
        assert_eq!(
            json,
            r#"["PlayerX","None","PlayerO","None","None","None","None","None","None"]"#
        );
    }

    #[test]
    fn integrity_check_rejects_mismatched_turn() {
        let mut session = Session::new();
        session.history.push(board("X"));
        session.current_step = 1;
        session.next_mark = Mark::PlayerX;

        assert_eq!(
            session.integrity_check(),
            Err(IntegrityError::TurnMismatch {
                step: 1,
                expected: Mark::PlayerO,
                actual: Mark::PlayerX,
            })
        );
    }

    #[test]
    fn integrity_check_rejects_double_placement() {
        let mut session = Session::new();
        session.history.push(board("XX"));
        session.current_step = 1;
        session.next_mark = Mark::PlayerO;

        assert_eq!(
            session.integrity_check(),
            Err(IntegrityError::InvalidTransition { step: 1 })
        );
    }

    #[test]
    fn integrity_check_rejects_move_after_win() {
        let mut session = Session::new();
        for layout in ["X", "X  O", "XX O", "XX OO", "XXXOO", "XXXOOO"] {
            session.history.push(board(layout));
        }
        session.current_step = 6;
        session.next_mark = Mark::PlayerX;

        assert_eq!(
            session.integrity_check(),
            Err(IntegrityError::InvalidTransition { step: 6 })
        );
    }

    #[test]
    fn deserializing_round_trips_a_played_session() {
        let mut session = Session::new();
        session.history.push(board("X"));
        session.history.push(board("X   O"));
        session.current_step = 1;
        session.next_mark = Mark::PlayerO;

        let json = serde_json::to_string(&session).expect("session should serialize");
        let restored: Session = serde_json::from_str(&json).expect("valid session should load");
        assert_eq!(restored, session);
    }

    #[test]
    fn deserializing_rejects_step_past_history() {
        let json = format!(
            r#"{{"history":[{}],"current_step":{},"next_mark":"PlayerX"}}"#,
            serde_json::to_string(&Board::empty()).expect("board should serialize"),
            usize::MAX
        );
        let error = serde_json::from_str::<Session>(&json).expect_err("step must be checked");
        assert!(
            error.to_string().contains("outside history"),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn deserializing_rejects_empty_next_mark() {
        let json = format!(
            r#"{{"history":[{}],"current_step":0,"next_mark":"None"}}"#,
            serde_json::to_string(&Board::empty()).expect("board should serialize")
        );
        assert!(serde_json::from_str::<Session>(&json).is_err());
    }

    #[test]
    fn deserializing_rejects_empty_history() {
        let json = r#"{"history":[],"current_step":0,"next_mark":"PlayerX"}"#;
        assert!(serde_json::from_str::<Session>(json).is_err());
    }

    #[test]
    fn integrity_check_rejects_non_empty_start() {
        let session = Session {
            history: vec![board("X")],
            current_step: 0,
            next_mark: Mark::PlayerX,
        };
        assert_eq!(session.integrity_check(), Err(IntegrityError::NonEmptyStart));
    }
}
