//! Arithmetic evaluator – the default [`Evaluator`] implementation.
//!
//! A small tokenizer plus a precedence-climbing parser over the keypad's
//! operator set. Evaluates while parsing; there is no AST.

use crate::traits::*;
use crate::types::Operator;

/// Maximum parenthesis / unary nesting accepted before bailing out.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(Operator),
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy)]
struct Spanned {
    token: Token,
    position: usize,
}

/// Evaluates `+ - * / %` with conventional precedence, unary signs and
/// parentheses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArithmeticEvaluator;

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&self, expression: &str) -> EvalResult<f64> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(EvalError::UnexpectedEnd);
        }

        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let value = parser.parse_expr(0)?;

        if let Some(extra) = parser.peek() {
            return Err(EvalError::Syntax {
                position: extra.position,
                message: "unexpected token after expression".into(),
            });
        }
        if !value.is_finite() {
            return Err(EvalError::NonFinite);
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize(input: &str) -> EvalResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut literal = String::new();
            let mut seen_point = false;
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() {
                    literal.push(d);
                } else if d == '.' && !seen_point {
                    seen_point = true;
                    literal.push(d);
                } else {
                    break;
                }
                chars.next();
            }
            let value = parse_number(&literal).ok_or_else(|| EvalError::Syntax {
                position,
                message: format!("invalid number '{}'", literal),
            })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                position,
            });
            continue;
        }

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => match Operator::from_symbol(other) {
                Some(op) => Token::Op(op),
                None => {
                    return Err(EvalError::Syntax {
                        position,
                        message: format!("unexpected character '{}'", other),
                    })
                }
            },
        };
        tokens.push(Spanned { token, position });
        chars.next();
    }

    Ok(tokens)
}

/// Accepts `12`, `12.`, `.5` and `12.5`; a bare `.` is rejected.
fn parse_number(literal: &str) -> Option<f64> {
    if !literal.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut normalized = String::with_capacity(literal.len() + 2);
    if literal.starts_with('.') {
        normalized.push('0');
    }
    normalized.push_str(literal);
    if literal.ends_with('.') {
        normalized.push('0');
    }
    normalized.parse().ok()
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let t = self.tokens.get(self.pos).copied();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_expr(&mut self, min_prec: u8) -> EvalResult<f64> {
        let mut lhs = self.parse_unary()?;

        while let Some(Token::Op(op)) = self.peek().map(|s| s.token) {
            if op.precedence() < min_prec {
                break;
            }
            self.pos += 1;
            // Left associativity: the right side only takes tighter operators.
            let rhs = self.parse_expr(op.precedence() + 1)?;
            lhs = apply(op, lhs, rhs)?;
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> EvalResult<f64> {
        self.enter()?;
        let result = match self.peek().map(|s| s.token) {
            Some(Token::Op(Operator::Subtract)) => {
                self.pos += 1;
                self.parse_unary().map(|v| -v)
            }
            Some(Token::Op(Operator::Add)) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        };
        self.depth -= 1;
        result
    }

    fn parse_primary(&mut self) -> EvalResult<f64> {
        let Some(spanned) = self.next() else {
            return Err(EvalError::UnexpectedEnd);
        };

        match spanned.token {
            Token::Number(v) => Ok(v),
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                match self.next() {
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(EvalError::Syntax {
                        position: other.position,
                        message: "expected ')'".into(),
                    }),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Token::RParen => Err(EvalError::Syntax {
                position: spanned.position,
                message: "unexpected ')'".into(),
            }),
            Token::Op(op) => Err(EvalError::Syntax {
                position: spanned.position,
                message: format!("expected a number, found '{}'", op),
            }),
        }
    }

    fn enter(&mut self) -> EvalResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let position = self.peek().map(|s| s.position).unwrap_or_default();
            return Err(EvalError::Syntax {
                position,
                message: "expression nested too deeply".into(),
            });
        }
        Ok(())
    }
}

fn apply(op: Operator, lhs: f64, rhs: f64) -> EvalResult<f64> {
    let value = match op {
        Operator::Add => lhs + rhs,
        Operator::Subtract => lhs - rhs,
        Operator::Multiply => lhs * rhs,
        Operator::Divide => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs / rhs
        }
        Operator::Remainder => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            // Truncated remainder, sign follows the dividend.
            lhs % rhs
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> EvalResult<f64> {
        ArithmeticEvaluator.evaluate(s)
    }

    #[test]
    fn test_single_operator() {
        assert_eq!(eval("2 + 3"), Ok(5.0));
        assert_eq!(eval("10 - 4"), Ok(6.0));
        assert_eq!(eval("6 * 7"), Ok(42.0));
        assert_eq!(eval("9 / 2"), Ok(4.5));
        assert_eq!(eval("7 % 3"), Ok(1.0));
    }

    #[test]
    fn test_lone_number_forms() {
        assert_eq!(eval("42"), Ok(42.0));
        assert_eq!(eval("0."), Ok(0.0));
        assert_eq!(eval("5."), Ok(5.0));
        assert_eq!(eval(".5"), Ok(0.5));
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("2 + 3 * 4"), Ok(14.0));
        assert_eq!(eval("10 - 4 - 3"), Ok(3.0));
        assert_eq!(eval("64 / 4 / 2"), Ok(8.0));
        assert_eq!(eval("1 + 10 % 4"), Ok(3.0));
        assert_eq!(eval("(2 + 3) * 4"), Ok(20.0));
    }

    #[test]
    fn test_negative_operands() {
        // A negative result fed back in as the left operand.
        assert_eq!(eval("-3 - 2"), Ok(-5.0));
        assert_eq!(eval("-3 * -2"), Ok(6.0));
        assert_eq!(eval("-7 % 3"), Ok(-1.0));
    }

    #[test]
    fn test_keypad_glyphs() {
        assert_eq!(eval("8 ÷ 2"), Ok(4.0));
        assert_eq!(eval("8 × 2"), Ok(16.0));
        assert_eq!(eval("8 − 2"), Ok(6.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("5 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("5 % 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("5 / 0.0"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_overflow_is_non_finite() {
        let huge = format!("1{} * 1{}", "0".repeat(200), "0".repeat(200));
        assert_eq!(eval(&huge), Err(EvalError::NonFinite));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(eval(""), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval("2 +"), Err(EvalError::UnexpectedEnd));
        assert!(matches!(eval("Error + 2"), Err(EvalError::Syntax { position: 0, .. })));
        assert!(matches!(eval("2 * / 3"), Err(EvalError::Syntax { .. })));
        assert!(matches!(eval("."), Err(EvalError::Syntax { .. })));
        assert!(matches!(eval("(1 + 2"), Err(EvalError::UnexpectedEnd)));
        assert!(matches!(eval("1 + 2)"), Err(EvalError::Syntax { .. })));
    }

    #[test]
    fn test_no_code_execution_surface() {
        assert!(eval("alert(1)").is_err());
        assert!(eval("2; 3").is_err());
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let deep = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
        assert!(matches!(eval(&deep), Err(EvalError::Syntax { .. })));
        let negs = format!("{}1", "-".repeat(1000));
        assert!(matches!(eval(&negs), Err(EvalError::Syntax { .. })));
    }
}
