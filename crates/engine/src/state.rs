//! Calculator input state machine.
//!
//! Every transition takes the current state by reference and returns the
//! next one, so the machine can be driven and tested without any host.
//! Two modes exist: accumulating (`just_evaluated == false`) and
//! post-result (`just_evaluated == true`).

use crate::format::format_rounded;
use crate::traits::Evaluator;
use crate::types::{HistoryEntry, Key, Operator};
use serde::{Deserialize, Serialize};

/// Display text shown after a failed evaluation.
pub const ERROR_TEXT: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorState {
    /// Operand being typed; primary display.
    pub current_input: String,
    /// `"<operand> <op> "` waiting for the second operand; secondary display.
    pub pending_expression: String,
    pub just_evaluated: bool,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            current_input: "0".to_string(),
            pending_expression: String::new(),
            just_evaluated: false,
        }
    }
}

impl CalculatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_error(&self) -> bool {
        self.current_input == ERROR_TEXT
    }

    /// `d` must be in `0..=9`; anything larger is ignored.
    pub fn apply_digit(&self, d: u8) -> Self {
        let Some(c) = char::from_digit(u32::from(d), 10) else {
            tracing::debug!(digit = d, "ignoring out-of-range digit");
            return self.clone();
        };

        if self.just_evaluated {
            return Self {
                current_input: c.to_string(),
                pending_expression: String::new(),
                just_evaluated: false,
            };
        }

        let mut next = self.clone();
        if next.current_input == "0" {
            next.current_input = c.to_string();
        } else {
            next.current_input.push(c);
        }
        next
    }

    pub fn apply_decimal_point(&self) -> Self {
        if self.just_evaluated {
            return Self {
                current_input: "0.".to_string(),
                pending_expression: String::new(),
                just_evaluated: false,
            };
        }

        let mut next = self.clone();
        if !next.current_input.contains('.') {
            next.current_input.push('.');
        }
        next
    }

    /// Replaces any pending expression; chains are not folded.
    pub fn apply_operator(&self, op: Operator) -> Self {
        Self {
            pending_expression: format!("{} {} ", self.current_input, op.symbol()),
            current_input: "0".to_string(),
            just_evaluated: false,
        }
    }

    pub fn apply_delete(&self) -> Self {
        if self.just_evaluated {
            return Self::default();
        }

        let mut next = self.clone();
        if next.current_input.chars().count() <= 1 {
            next.current_input = "0".to_string();
        } else {
            next.current_input.pop();
        }
        next
    }

    pub fn apply_clear(&self) -> Self {
        Self::default()
    }

    /// Evaluate `pending_expression + current_input`.
    ///
    /// Returns the next state and, on success, the history entry to record.
    /// Failures never escape: the display becomes [`ERROR_TEXT`].
    pub fn apply_equals(
        &self,
        evaluator: &dyn Evaluator,
        decimal_places: u32,
    ) -> (Self, Option<HistoryEntry>) {
        if self.pending_expression.is_empty() && self.current_input == "0" {
            return (self.clone(), None);
        }

        let expression = format!("{}{}", self.pending_expression, self.current_input);
        match evaluator.evaluate(&expression) {
            Ok(value) if value.is_finite() => {
                let result = format_rounded(value, decimal_places);
                tracing::debug!(expression = %expression, result = %result, "evaluated");
                let next = Self {
                    current_input: result.clone(),
                    pending_expression: String::new(),
                    just_evaluated: true,
                };
                (next, Some(HistoryEntry { expression, result }))
            }
            outcome => {
                match outcome {
                    Err(e) => tracing::debug!(expression = %expression, error = %e, "evaluation failed"),
                    Ok(value) => tracing::warn!(
                        expression = %expression,
                        value,
                        "evaluator returned a non-finite value"
                    ),
                }
                let next = Self {
                    current_input: ERROR_TEXT.to_string(),
                    pending_expression: String::new(),
                    just_evaluated: true,
                };
                (next, None)
            }
        }
    }

    /// Dispatch a single token.
    pub fn apply_key(
        &self,
        key: Key,
        evaluator: &dyn Evaluator,
        decimal_places: u32,
    ) -> (Self, Option<HistoryEntry>) {
        match key {
            Key::Digit(d) => (self.apply_digit(d), None),
            Key::DecimalPoint => (self.apply_decimal_point(), None),
            Key::Operator(op) => (self.apply_operator(op), None),
            Key::Delete => (self.apply_delete(), None),
            Key::Clear => (self.apply_clear(), None),
            Key::Equals => self.apply_equals(evaluator, decimal_places),
        }
    }
}
