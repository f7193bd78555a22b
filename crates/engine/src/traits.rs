/// Result type for evaluation capability calls.
pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

// ---------------------------------------------------------------------------
// Evaluation capability
// ---------------------------------------------------------------------------

/// Turns arithmetic text into a finite number.
///
/// The engine only ever hands over `"A op B"` or a lone number, but
/// implementations are free to accept more.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str) -> EvalResult<f64>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> EvalResult<f64> + Send + Sync,
{
    fn evaluate(&self, expression: &str) -> EvalResult<f64> {
        self(expression)
    }
}
