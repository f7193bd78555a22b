//! Scenario runner – execute scripted key/command flows from YAML files.

use crate::calculator::Calculator;
use crate::commands::CommandRegistry;
use crate::types::*;
use std::time::Instant;

/// Load a scenario from a YAML string.
pub fn load_scenario(yaml: &str) -> Result<Scenario, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("failed to parse scenario YAML: {}", e))
}

/// Execute a scenario against `calc` and return the overall result.
///
/// Every step runs even after a mismatch.
pub fn run_scenario(
    scenario: &Scenario,
    calc: &mut Calculator,
    registry: &CommandRegistry,
) -> ScenarioResult {
    let mut step_results = Vec::new();
    let mut overall = Status::Pass;

    for (i, step) in scenario.steps.iter().enumerate() {
        let (mut result, expect) = match step {
            ScenarioStep::Keys { keys, expect } => {
                let start = Instant::now();
                let mut r = registry.execute("press", serde_json::json!({ "keys": keys }), calc);
                r.command = "keys".into();
                r.target = keys.clone();
                r.timing_ms.total = start.elapsed().as_millis() as u64;
                if r.status != Status::Pass {
                    overall = Status::Fail;
                }
                (r, expect)
            }
            ScenarioStep::Call {
                call,
                args,
                expect_status,
                expect,
            } => {
                let r = registry.execute(call, args.clone(), calc);
                if r.status.as_str() != expect_status {
                    tracing::warn!(
                        step = i,
                        expected = %expect_status,
                        actual = %r.status.as_str(),
                        "scenario step status mismatch"
                    );
                    overall = Status::Fail;
                }
                (r, expect)
            }
        };

        if let Some(expect) = expect {
            let mismatches = check_expectation(expect, calc);
            if !mismatches.is_empty() {
                tracing::warn!(step = i, ?mismatches, "scenario step expectation mismatch");
                result.status = Status::Fail;
                result.error = Some(ErrorInfo {
                    code: ErrorCode::InvalidInput,
                    message: mismatches.join("; "),
                    details: serde_json::Value::Null,
                });
                overall = Status::Fail;
            }
        }

        step_results.push(result);
    }

    ScenarioResult {
        name: scenario.name.clone(),
        overall_status: overall,
        step_results,
    }
}

fn check_expectation(expect: &Expectation, calc: &Calculator) -> Vec<String> {
    let mut mismatches = Vec::new();
    if let Some(ref display) = expect.display {
        if calc.display() != display {
            mismatches.push(format!(
                "display: expected {:?}, got {:?}",
                display,
                calc.display()
            ));
        }
    }
    if let Some(ref equation) = expect.equation {
        if calc.equation() != equation {
            mismatches.push(format!(
                "equation: expected {:?}, got {:?}",
                equation,
                calc.equation()
            ));
        }
    }
    if let Some(len) = expect.history_len {
        if calc.history().len() != len {
            mismatches.push(format!(
                "history_len: expected {}, got {}",
                len,
                calc.history().len()
            ));
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
name: basic arithmetic
steps:
  - keys: "2+3="
    expect:
      display: "5"
      history_len: 1
  - call: "recall"
    args: { index: 0 }
    expect_status: "pass"
"#;
        let s = load_scenario(yaml).expect("should parse");
        assert_eq!(s.name, Some("basic arithmetic".into()));
        assert_eq!(s.steps.len(), 2);
        assert!(matches!(s.steps[0], ScenarioStep::Keys { .. }));
        assert!(matches!(s.steps[1], ScenarioStep::Call { .. }));
    }

    #[test]
    fn test_run_scenario_pass() {
        let yaml = r#"
steps:
  - keys: "5 ÷ 0 ="
    expect: { display: "Error", equation: "", history_len: 0 }
  - keys: "7"
    expect: { display: "7" }
  - call: "state"
"#;
        let scenario = load_scenario(yaml).unwrap();
        let mut calc = Calculator::default();
        let reg = CommandRegistry::new();
        let result = run_scenario(&scenario, &mut calc, &reg);
        assert_eq!(result.overall_status, Status::Pass);
        assert_eq!(result.step_results.len(), 3);
        assert_eq!(result.step_results[0].command, "keys");
    }

    #[test]
    fn test_run_scenario_expectation_mismatch() {
        let yaml = r#"
steps:
  - keys: "1+1="
    expect: { display: "3" }
  - keys: "C"
    expect: { display: "0" }
"#;
        let scenario = load_scenario(yaml).unwrap();
        let mut calc = Calculator::default();
        let reg = CommandRegistry::new();
        let result = run_scenario(&scenario, &mut calc, &reg);
        assert_eq!(result.overall_status, Status::Fail);
        assert_eq!(result.step_results[0].status, Status::Fail);
        assert!(result.step_results[0]
            .error
            .as_ref()
            .unwrap()
            .message
            .contains("expected \"3\""));
        assert_eq!(result.step_results[1].status, Status::Pass);
    }

    #[test]
    fn test_expected_error_status() {
        let yaml = r#"
steps:
  - call: "recall"
    args: { index: 0 }
    expect_status: "error"
"#;
        let scenario = load_scenario(yaml).unwrap();
        let mut calc = Calculator::default();
        let result = run_scenario(&scenario, &mut calc, &CommandRegistry::new());
        assert_eq!(result.overall_status, Status::Pass);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(load_scenario("steps: 3").is_err());
    }
}
