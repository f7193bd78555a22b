//! Command registry and built-in calculator commands.
//!
//! Commands are registered by name and invoked with JSON input/output
//! against a single [`Calculator`].

use crate::calculator::{Calculator, CalculatorError};
use crate::format::format_rounded;
use crate::keys::{parse_keys, KeyError};
use crate::traits::{EvalError, Evaluator};
use crate::types::*;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

/// Signature for all engine commands.
pub type CommandHandler = fn(Value, &mut Calculator) -> Result<Value, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvalError),
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CommandError::InvalidInput(_) | CommandError::Key(_) => ErrorCode::InvalidInput,
            CommandError::Calculator(CalculatorError::HistoryOutOfRange { .. }) => {
                ErrorCode::OutOfRange
            }
            CommandError::Evaluation(_) => ErrorCode::EvaluationFailed,
            CommandError::Other(_) => ErrorCode::InternalError,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            handlers: HashMap::new(),
        };
        reg.register("press", cmd_press);
        reg.register("digit", cmd_digit);
        reg.register("decimal", cmd_decimal);
        reg.register("operator", cmd_operator);
        reg.register("equals", cmd_equals);
        reg.register("delete", cmd_delete);
        reg.register("clear", cmd_clear);
        reg.register("state", cmd_state);
        reg.register("history", cmd_history);
        reg.register("clear_history", cmd_clear_history);
        reg.register("recall", cmd_recall);
        reg.register("evaluate", cmd_evaluate);
        reg
    }

    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Execute a command by name and return a full CommandResult.
    pub fn execute(&self, name: &str, args: Value, calc: &mut Calculator) -> CommandResult {
        let run_id = new_run_id();
        let start = Instant::now();

        let Some(handler) = self.handlers.get(name) else {
            return result_err(
                "call",
                name,
                &run_id,
                start.elapsed().as_millis() as u64,
                ErrorCode::InvalidInput,
                format!("unknown command: {}", name),
            );
        };

        match handler(args, calc) {
            Ok(data) => {
                let mut r = result_ok("call", name, &run_id, start.elapsed().as_millis() as u64);
                r.data = Some(data);
                r
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "command failed");
                result_err(
                    "call",
                    name,
                    &run_id,
                    start.elapsed().as_millis() as u64,
                    e.error_code(),
                    e.to_string(),
                )
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_value(calc: &Calculator) -> Result<Value, CommandError> {
    serde_json::to_value(calc.snapshot()).map_err(|e| CommandError::Other(e.to_string()))
}

fn str_arg<'a>(args: &'a Value, field: &str) -> Result<&'a str, CommandError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| CommandError::InvalidInput(format!("missing '{}' string field", field)))
}

fn uint_arg(args: &Value, field: &str) -> Result<u64, CommandError> {
    args.get(field).and_then(|v| v.as_u64()).ok_or_else(|| {
        CommandError::InvalidInput(format!("missing '{}' non-negative integer field", field))
    })
}

// ===========================================================================
// Built-in commands
// ===========================================================================

/// `press` – apply a key sequence.
///
/// Args: `{ "keys": "12+3=" }`
fn cmd_press(args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    let keys = parse_keys(str_arg(&args, "keys")?)?;
    calc.press_all(keys);
    snapshot_value(calc)
}

/// `digit` – Args: `{ "digit": 7 }`
fn cmd_digit(args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    let d = uint_arg(&args, "digit")?;
    if d > 9 {
        return Err(CommandError::InvalidInput(format!(
            "digit must be 0-9, got {}",
            d
        )));
    }
    calc.press(Key::Digit(d as u8));
    snapshot_value(calc)
}

fn cmd_decimal(_args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    calc.press(Key::DecimalPoint);
    snapshot_value(calc)
}

/// `operator` – Args: `{ "op": "+" }` (also `−`, `×`, `÷`).
fn cmd_operator(args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    let symbol = str_arg(&args, "op")?;
    let mut chars = symbol.chars();
    let op = match (chars.next(), chars.next()) {
        (Some(c), None) => Operator::from_symbol(c),
        _ => None,
    }
    .ok_or_else(|| CommandError::InvalidInput(format!("unknown operator: {:?}", symbol)))?;
    calc.press(Key::Operator(op));
    snapshot_value(calc)
}

/// `equals` – evaluate; data also carries the recorded `entry` (or null).
fn cmd_equals(_args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    let entry = calc.press(Key::Equals);
    let mut data = snapshot_value(calc)?;
    if let Value::Object(ref mut map) = data {
        map.insert(
            "entry".into(),
            serde_json::to_value(entry).map_err(|e| CommandError::Other(e.to_string()))?,
        );
    }
    Ok(data)
}

fn cmd_delete(_args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    calc.press(Key::Delete);
    snapshot_value(calc)
}

fn cmd_clear(_args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    calc.press(Key::Clear);
    snapshot_value(calc)
}

fn cmd_state(_args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    snapshot_value(calc)
}

/// `history` – Returns: `{ "entries": [...], "is_empty": bool }`
fn cmd_history(_args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    Ok(serde_json::json!({
        "entries": calc.history().to_vec(),
        "is_empty": calc.history().is_empty(),
    }))
}

fn cmd_clear_history(_args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    calc.clear_history();
    snapshot_value(calc)
}

/// `recall` – Args: `{ "index": 0 }` (0 = newest)
fn cmd_recall(args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    let index = uint_arg(&args, "index")? as usize;
    calc.recall(index)?;
    snapshot_value(calc)
}

/// `evaluate` – stateless evaluation, does not touch display or history.
///
/// Args: `{ "expression": "2 * 3" }`
/// Returns: `{ "value": 6.0, "result": "6" }`
fn cmd_evaluate(args: Value, calc: &mut Calculator) -> Result<Value, CommandError> {
    let expression = str_arg(&args, "expression")?;
    let value = calc.evaluator().evaluate(expression)?;
    Ok(serde_json::json!({
        "value": value,
        "result": format_rounded(value, calc.decimal_places()),
    }))
}

// ===========================================================================
// Tests
// ===========================================================================
