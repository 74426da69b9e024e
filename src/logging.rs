//! 将 `log` 宏输出到浏览器控制台。

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::str::FromStr;
use wasm_bindgen::JsValue;

pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::log_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// 日志级别配置，支持常见别名。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub LevelFilter);

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(LevelFilter::Info)
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "silent" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" | "verbose" => LevelFilter::Trace,
            _ => return Err(()),
        };
        Ok(LogLevel(filter))
    }
}

/// Installs the console logger once; later calls only adjust the level.
pub fn init(level: LogLevel) {
    if log::set_logger(&LOGGER).is_err() {
        log::debug!("console logger already installed, updating level to {}", level.0);
    }
    log::set_max_level(level.0);
}
