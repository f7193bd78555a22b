//! `calcctl` – headless driver for the keypad calculator engine.
//!
//! Runs the same engine a graphical keypad would, without any window:
//! one-shot key presses, JSON command calls, scripted scenarios, an
//! interactive prompt and a socket daemon.

mod config;
mod logging;
mod repl;
mod serve;

use clap::{Parser, Subcommand};
use engine::types::*;
use engine::{Calculator, CommandRegistry, CommandResult};
use std::path::{Path, PathBuf};

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "calcctl",
    version,
    about = "Headless driver for the keypad calculator engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Press keys on a fresh calculator and print the resulting display.
    Press {
        /// Key sequence, e.g. "12+3=" or "1 2 + 3 Enter".
        #[arg(required = true)]
        keys: Vec<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Invoke an engine command by name with JSON args.
    Call {
        /// Command name (e.g. "press", "equals", "recall", "evaluate").
        cmd: String,
        /// JSON args to pass to the command.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Keys to press before the command runs.
        #[arg(long)]
        keys: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run a scripted scenario from a YAML file.
    RunScenario {
        /// Path to the scenario YAML file.
        file: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive keypad prompt.
    Repl,

    /// Start daemon mode over a Unix socket.
    Serve {
        /// Path for the Unix domain socket.
        #[arg(long)]
        socket: PathBuf,
    },

    /// Print the effective configuration.
    Config {
        /// Pretty-print instead of a single JSON line.
        #[arg(long)]
        json: bool,
    },
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let app_config = config::get_config()?;
    logging::init_logging(&app_config.logging);

    let calc = app_config.build_calculator();
    let registry = CommandRegistry::new();

    match cli.command {
        Commands::Press { keys, json } => cmd_press(&keys.join(" "), json, calc, &registry),
        Commands::Call {
            cmd,
            args,
            keys,
            json,
        } => cmd_call(&cmd, &args, keys.as_deref(), json, calc, &registry),
        Commands::RunScenario { file, json } => cmd_run_scenario(&file, json, calc, &registry),
        Commands::Repl => repl::run(calc)?,
        Commands::Serve { socket } => serve::run_daemon(socket, calc, registry).await?,
        Commands::Config { json } => cmd_config(app_config, json)?,
    }

    Ok(())
}

// ===========================================================================
// Subcommand implementations
// ===========================================================================

fn cmd_press(keys: &str, json: bool, mut calc: Calculator, registry: &CommandRegistry) {
    let result = registry.execute("press", serde_json::json!({ "keys": keys }), &mut calc);
    output_result(&result, json);
}

fn cmd_call(
    cmd: &str,
    args_str: &str,
    keys: Option<&str>,
    json: bool,
    mut calc: Calculator,
    registry: &CommandRegistry,
) {
    let args: serde_json::Value = match serde_json::from_str(args_str) {
        Ok(v) => v,
        Err(e) => {
            let r = result_err(
                "call",
                cmd,
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                format!("invalid JSON args: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    if let Some(keys) = keys {
        let warmup = registry.execute("press", serde_json::json!({ "keys": keys }), &mut calc);
        if warmup.status != Status::Pass {
            output_result(&warmup, json);
            return;
        }
    }

    let result = registry.execute(cmd, args, &mut calc);
    output_result(&result, json);
}

fn cmd_run_scenario(file: &Path, json: bool, mut calc: Calculator, registry: &CommandRegistry) {
    let yaml = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::IoError,
                format!("cannot read scenario file: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario = match engine::scenario::load_scenario(&yaml) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                e,
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario_result = engine::scenario::run_scenario(&scenario, &mut calc, registry);

    if json {
        let j = serde_json::to_string_pretty(&scenario_result).unwrap_or_default();
        println!("{}", j);
    } else {
        println!(
            "Scenario: {}",
            scenario_result.name.as_deref().unwrap_or("<unnamed>")
        );
        println!("Overall: {:?}", scenario_result.overall_status);
        for (i, sr) in scenario_result.step_results.iter().enumerate() {
            println!(
                "  Step {}: {} {} -> {:?} ({}ms)",
                i, sr.command, sr.target, sr.status, sr.timing_ms.total
            );
            if let Some(ref err) = sr.error {
                println!("    {} – {}", err.code, err.message);
            }
        }
    }

    exit_for_status(scenario_result.overall_status);
}

fn cmd_config(app_config: &config::AppConfig, json: bool) -> anyhow::Result<()> {
    let j = if json {
        serde_json::to_string_pretty(app_config)?
    } else {
        serde_json::to_string(app_config)?
    };
    println!("{}", j);
    Ok(())
}

// ===========================================================================
// Output helpers
// ===========================================================================

fn output_result(result: &CommandResult, json: bool) {
    if json {
        let j = serde_json::to_string_pretty(result).unwrap_or_default();
        println!("{}", j);
    } else {
        print_human(result);
    }
    exit_for_status(result.status);
}

/// Non-zero exit on error/fail.
fn exit_for_status(status: Status) {
    match status {
        Status::Pass => {}
        Status::Fail => std::process::exit(1),
        Status::Error => std::process::exit(2),
    }
}

fn print_human(r: &CommandResult) {
    let status_icon = match r.status {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
        Status::Error => "ERROR",
    };

    println!("[{}] {} {}", status_icon, r.command, r.target);

    if let Some(ref err) = r.error {
        println!("  error:  {} – {}", err.code, err.message);
    }

    let Some(ref data) = r.data else {
        return;
    };

    // Snapshot-shaped payloads get a calculator-style rendering.
    if let (Some(display), Some(equation)) = (
        data.get("display").and_then(|v| v.as_str()),
        data.get("equation").and_then(|v| v.as_str()),
    ) {
        if !equation.is_empty() {
            println!("  {}", equation);
        }
        println!("  = {}", display);
        if let Some(entries) = data.get("history").and_then(|v| v.as_array()) {
            for entry in entries {
                println!(
                    "    {} = {}",
                    entry["expression"].as_str().unwrap_or_default(),
                    entry["result"].as_str().unwrap_or_default()
                );
            }
        }
        return;
    }

    if let Ok(s) = serde_json::to_string_pretty(data) {
        for line in s.lines() {
            println!("  {}", line);
        }
    }
}
