//! Calculator – owns the state machine, its history and the evaluator.

use crate::evaluator::ArithmeticEvaluator;
use crate::format::DEFAULT_DECIMAL_PLACES;
use crate::history::{HistoryLog, DEFAULT_HISTORY_CAPACITY};
use crate::state::CalculatorState;
use crate::traits::Evaluator;
use crate::types::{HistoryEntry, Key, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum CalculatorError {
    #[error("history index {index} out of range (len {len})")]
    HistoryOutOfRange { index: usize, len: usize },
}

/// Central object a host drives with key presses.
///
/// Holds the evaluator as a trait object so hosts and tests can swap it.
/// Not designed for concurrent mutation; keep one owner.
pub struct Calculator {
    state: CalculatorState,
    history: HistoryLog,
    evaluator: Box<dyn Evaluator>,
    decimal_places: u32,
}

impl Calculator {
    pub fn new(evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            state: CalculatorState::default(),
            history: HistoryLog::with_capacity(DEFAULT_HISTORY_CAPACITY),
            evaluator,
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }

    /// Calculator backed by the built-in arithmetic evaluator.
    pub fn default_arithmetic() -> Self {
        Self::new(Box::new(ArithmeticEvaluator))
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = HistoryLog::with_capacity(capacity);
        self
    }

    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = places;
        self
    }

    /// Apply one token. Returns the history entry recorded, if any.
    pub fn press(&mut self, key: Key) -> Option<HistoryEntry> {
        let (next, entry) = self
            .state
            .apply_key(key, self.evaluator.as_ref(), self.decimal_places);
        tracing::debug!(
            ?key,
            display = %next.current_input,
            equation = %next.pending_expression,
            "key applied"
        );
        self.state = next;
        if let Some(ref e) = entry {
            self.history.push(e.clone());
        }
        entry
    }

    pub fn press_all(&mut self, keys: impl IntoIterator<Item = Key>) {
        for key in keys {
            self.press(key);
        }
    }

    /// Put a past result back on the primary display.
    pub fn recall(&mut self, index: usize) -> Result<&CalculatorState, CalculatorError> {
        let entry = self
            .history
            .get(index)
            .ok_or(CalculatorError::HistoryOutOfRange {
                index,
                len: self.history.len(),
            })?;
        self.state.current_input = entry.result.clone();
        Ok(&self.state)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    pub fn display(&self) -> &str {
        &self.state.current_input
    }

    pub fn equation(&self) -> &str {
        &self.state.pending_expression
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            display: self.state.current_input.clone(),
            equation: self.state.pending_expression.clone(),
            just_evaluated: self.state.just_evaluated,
            history: self.history.to_vec(),
        }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::default_arithmetic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::parse_keys;

    fn run(calc: &mut Calculator, keys: &str) {
        calc.press_all(parse_keys(keys).unwrap());
    }

    #[test]
    fn test_history_prepended() {
        let mut calc = Calculator::default();
        run(&mut calc, "2+3=");
        run(&mut calc, "4*5=");
        let h = calc.history();
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(0).unwrap().expression, "4 * 5");
        assert_eq!(h.get(1).unwrap().result, "5");
    }

    #[test]
    fn test_failures_not_recorded() {
        let mut calc = Calculator::default();
        run(&mut calc, "5÷0=");
        assert_eq!(calc.display(), "Error");
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_history_capped_at_twenty() {
        let mut calc = Calculator::default();
        for n in 1..=21 {
            run(&mut calc, &format!("{}+0=", n));
        }
        assert_eq!(calc.history().len(), 20);
        assert_eq!(calc.history().get(0).unwrap().result, "21");
        assert!(calc.history().iter().all(|e| e.expression != "1 + 0"));
    }

    #[test]
    fn test_custom_capacity_and_places() {
        let mut calc = Calculator::default()
            .with_history_capacity(2)
            .with_decimal_places(2);
        run(&mut calc, "1÷3=");
        assert_eq!(calc.display(), "0.33");
        run(&mut calc, "2=");
        run(&mut calc, "3=");
        assert_eq!(calc.history().len(), 2);
    }

    #[test]
    fn test_huge_decimal_places_keep_fraction() {
        let mut calc = Calculator::default().with_decimal_places(u32::MAX);
        run(&mut calc, "1234.5678+0=");
        assert_eq!(calc.display(), "1234.5678");
        assert!(!calc.state().is_error());
    }

    #[test]
    fn test_recall() {
        let mut calc = Calculator::default();
        run(&mut calc, "6*7=");
        run(&mut calc, "1+");
        let state = calc.recall(0).unwrap();
        assert_eq!(state.current_input, "42");
        assert_eq!(state.pending_expression, "1 + ");
        run(&mut calc, "=");
        assert_eq!(calc.display(), "43");
    }

    #[test]
    fn test_recall_out_of_range() {
        let mut calc = Calculator::default();
        let err = calc.recall(3).unwrap_err();
        assert!(matches!(
            err,
            CalculatorError::HistoryOutOfRange { index: 3, len: 0 }
        ));
    }

    #[test]
    fn test_clear_history_keeps_display() {
        let mut calc = Calculator::default();
        run(&mut calc, "9-1=");
        calc.clear_history();
        assert!(calc.history().is_empty());
        assert_eq!(calc.display(), "8");
    }

    #[test]
    fn test_snapshot() {
        let mut calc = Calculator::default();
        run(&mut calc, "12+");
        let snap = calc.snapshot();
        assert_eq!(snap.display, "0");
        assert_eq!(snap.equation, "12 + ");
        assert!(!snap.just_evaluated);
        assert!(snap.history.is_empty());
    }
}
