use serde::{Deserialize, Serialize};

use super::rules::{self, Outcome, RuleError};
use super::state::{Board, Mark, Session, CELL_COUNT};

/// 历史列表中的一项。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveEntry {
    pub step: usize,
    pub label: String,
    #[serde(default)]
    pub is_current: bool,
}

/// 前端渲染所需的全部数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameView {
    pub board: Board,
    /// 每格显示的符号，空格为 `null`。
    pub cells: [Option<char>; CELL_COUNT],
    pub status: String,
    pub move_list: Vec<MoveEntry>,
    pub current_step: usize,
    pub next_mark: Mark,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<[usize; 3]>,
    #[serde(default)]
    pub is_draw: bool,
}

/// Places `next_mark` at `cell_index`, discarding any history past the current step.
pub fn try_apply_move(session: &Session, cell_index: usize) -> Result<Session, RuleError> {
    let board = session.current_board();
    rules::check_move(&board, cell_index)?;

    let next_board = board.with_mark(cell_index, session.next_mark);
    let mut history: Vec<Board> = session
        .history
        .iter()
        .take(session.current_step + 1)
        .copied()
        .collect();
    history.push(next_board);
    let current_step = history.len() - 1;

    Ok(Session {
        history,
        current_step,
        next_mark: session.next_mark.opponent(),
    })
}

/// 非法落子（格子已占用、已分胜负、越界）静默忽略，原样返回会话。
pub fn apply_move(session: &Session, cell_index: usize) -> Session {
    match try_apply_move(session, cell_index) {
        Ok(next) => next,
        Err(error) => {
            log::debug!("ignoring move at cell {cell_index}: {error}");
            session.clone()
        }
    }
}

pub fn jump_to(session: &Session, step: usize) -> Result<Session, RuleError> {
    let len = session.history.len();
    if step >= len {
        log::debug!("rejecting jump to step {step}, history has {len} entries");
        return Err(RuleError::StepOutOfRange { step, len });
    }

    Ok(Session {
        history: session.history.clone(),
        current_step: step,
        next_mark: Mark::for_step(step),
    })
}

pub fn move_label(step: usize) -> String {
    if step == 0 {
        "Go to game start".to_string()
    } else {
        format!("Go to move #{step}")
    }
}

pub fn derive_view(session: &Session) -> GameView {
    let board = session.current_board();
    let (status, winner, winning_line, is_draw) = match rules::outcome(&board) {
        Outcome::Won { winner, line } => (
            format!("Winner: {winner}"),
            Some(winner),
            Some(line),
            false,
        ),
        Outcome::Draw => ("Draw".to_string(), None, None, true),
        Outcome::InProgress => (
            format!("Next player: {}", session.next_mark),
            None,
            None,
            false,
        ),
    };

    let move_list = (0..session.history.len())
        .map(|step| MoveEntry {
            step,
            label: move_label(step),
            is_current: step == session.current_step,
        })
        .collect();

    GameView {
        board,
        cells: (*board.cells()).map(Mark::symbol),
        status,
        move_list,
        current_step: session.current_step,
        next_mark: session.next_mark,
        winner,
        winning_line,
        is_draw,
    }
}
