pub mod game;
pub mod logging;

use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use game::{
    apply_move, derive_view, evaluate_winner, jump_to, try_apply_move, Board, GameView,
    IntegrityError, Mark, MoveEntry, Outcome, RuleError, Session,
};
pub use logging::LogLevel;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    logging::init(LogLevel::default());
}

/// 设置控制台日志级别，未知级别回退到 info。
#[wasm_bindgen(js_name = "initLogging")]
pub fn init_logging(level: Option<String>) {
    let level = level
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or_default();
    logging::init(level);
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    to_js_error(RuleError::InvalidPayload {
        message: error.to_string(),
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

// Session deserialization runs the integrity check, so a parsed session is always consistent.
fn parse_session(json: &str) -> Result<Session, JsValue> {
    serde_json::from_str(json).map_err(serde_to_js_error)
}

fn session_from_js(value: JsValue) -> Result<Session, JsValue> {
    from_value(value).map_err(serde_to_js_error)
}

/// 持有单个会话的句柄，由前端在点击格子或历史项时调用。
#[wasm_bindgen]
pub struct GameController {
    session: Session,
}

#[wasm_bindgen]
impl GameController {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_session_json: Option<String>) -> Result<GameController, JsValue> {
        let session = if let Some(json) = initial_session_json {
            let session = parse_session(&json)?;
            log::info!(
                "restored session at step {} of {}",
                session.current_step(),
                session.history().len()
            );
            session
        } else {
            Session::new()
        };
        Ok(GameController { session })
    }

    pub fn session_json(&self) -> Result<String, JsValue> {
        to_json(&self.session)
    }

    pub fn set_session_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.session = parse_session(json)?;
        Ok(())
    }

    pub fn view_json(&self) -> Result<String, JsValue> {
        to_json(&derive_view(&self.session))
    }

    /// 点击格子；非法落子不改变状态。
    pub fn apply_move(&mut self, cell_index: usize) -> Result<String, JsValue> {
        self.session = apply_move(&self.session, cell_index);
        self.view_json()
    }

    pub fn jump_to(&mut self, step: usize) -> Result<String, JsValue> {
        self.session = jump_to(&self.session, step).map_err(to_js_error)?;
        self.view_json()
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        log::info!("starting a new game");
        self.session = Session::new();
        self.view_json()
    }
}

#[wasm_bindgen(js_name = "createSession")]
pub fn create_session() -> Result<JsValue, JsValue> {
    to_value(&Session::new()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move_js(session: JsValue, cell_index: usize) -> Result<JsValue, JsValue> {
    let session = session_from_js(session)?;
    to_value(&apply_move(&session, cell_index)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "jumpTo")]
pub fn jump_to_js(session: JsValue, step: usize) -> Result<JsValue, JsValue> {
    let session = session_from_js(session)?;
    match jump_to(&session, step) {
        Ok(next) => to_value(&next).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "deriveView")]
pub fn derive_view_js(session: JsValue) -> Result<JsValue, JsValue> {
    let session = session_from_js(session)?;
    to_value(&derive_view(&session)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "evaluateWinner")]
pub fn evaluate_winner_js(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(serde_to_js_error)?;
    to_value(&evaluate_winner(&board)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateSession")]
pub fn validate_session(session: JsValue) -> Result<(), JsValue> {
    session_from_js(session).map(|_| ())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
