//! 井字棋核心逻辑模块（棋盘状态、规则判定、会话控制）。

pub mod controller;
pub mod rules;
pub mod state;

pub use controller::{
    apply_move,
    derive_view,
    jump_to,
    move_label,
    try_apply_move,
    GameView,
    MoveEntry,
};
pub use rules::{
    check_move,
    evaluate_winner,
    is_draw,
    is_full,
    outcome,
    winning_line,
    Outcome,
    RuleError,
    LINES,
};
pub use state::{Board, IntegrityError, Mark, Session, CELL_COUNT};
