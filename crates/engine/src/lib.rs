//! Engine crate – headless keypad calculator.
//!
//! Holds the input state machine, the arithmetic evaluator and the history
//! log, plus the command registry and scenario runner hosts use to drive
//! it. Nothing here knows about rendering or key-event plumbing.

pub mod calculator;
pub mod commands;
pub mod evaluator;
pub mod format;
pub mod history;
pub mod keys;
pub mod scenario;
pub mod state;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use calculator::Calculator;
pub use commands::CommandRegistry;
pub use evaluator::ArithmeticEvaluator;
pub use state::CalculatorState;
pub use traits::{EvalError, Evaluator};
pub use types::{CommandResult, ErrorCode, ErrorInfo, HistoryEntry, Key, Operator, Snapshot, Status};
