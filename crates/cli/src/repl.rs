//! Interactive keypad prompt.
//!
//! Each line is a key sequence (`12+3=`, `5 Backspace`, ...) or a colon
//! command. The history panel toggle lives here, not in the engine.

use dialoguer::Input;
use engine::keys::parse_keys;
use engine::Calculator;

const HELP: &str = "\
keys:      0-9 . + - * / % = (also Enter, Backspace, Esc, ×, ÷, −)
commands:  :history      toggle the history panel
           :clear-history
           :recall N     put history entry N (0 = newest) on the display
           :help
           :quit";

#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Help,
    Quit,
}

pub struct Session {
    calc: Calculator,
    show_history: bool,
}

impl Session {
    pub fn new(calc: Calculator) -> Self {
        Self {
            calc,
            show_history: false,
        }
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calc
    }

    pub fn history_visible(&self) -> bool {
        self.show_history
    }

    /// Apply one input line. Problems are returned as a message for the
    /// user; they never end the session.
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome, String> {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            let keys = parse_keys(line).map_err(|e| e.to_string())?;
            self.calc.press_all(keys);
            return Ok(LineOutcome::Continue);
        };

        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or("") {
            "q" | "quit" | "exit" => return Ok(LineOutcome::Quit),
            "history" => self.show_history = !self.show_history,
            "clear-history" => self.calc.clear_history(),
            "recall" => {
                let index = parts
                    .next()
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(|| "usage: :recall N".to_string())?;
                self.calc.recall(index).map_err(|e| e.to_string())?;
                // Selecting a row closes the panel.
                self.show_history = false;
            }
            "help" | "?" => return Ok(LineOutcome::Help),
            other => return Err(format!("unknown command :{} (try :help)", other)),
        }
        Ok(LineOutcome::Continue)
    }

    pub fn render(&self) -> String {
        let calc = self.calculator();
        let width = calc.display().len().max(calc.equation().len()).max(16);
        let mut out = String::new();
        out.push_str(&format!("  {:>width$}\n", calc.equation(), width = width));
        out.push_str(&format!("  {:>width$}\n", calc.display(), width = width));
        if calc.state().is_error() {
            out.push_str("  (press a digit or Esc to start over)\n");
        }

        if self.history_visible() {
            out.push_str(&format!(
                "  -- history ({}/{}) --\n",
                calc.history().len(),
                calc.history().capacity()
            ));
            if calc.history().is_empty() {
                out.push_str("  No history yet\n");
            }
            for (i, entry) in calc.history().iter().enumerate() {
                out.push_str(&format!("  [{}] {} = {}\n", i, entry.expression, entry.result));
            }
        }
        out
    }
}

pub fn run(calc: Calculator) -> anyhow::Result<()> {
    let mut session = Session::new(calc);
    println!("{}", HELP);
    print!("{}", session.render());

    loop {
        let line = Input::<String>::new()
            .with_prompt("calc")
            .allow_empty(true)
            .interact_text()?;

        match session.handle_line(&line) {
            Ok(LineOutcome::Quit) => break,
            Ok(LineOutcome::Help) => println!("{}", HELP),
            Ok(LineOutcome::Continue) => print!("{}", session.render()),
            Err(msg) => eprintln!("  {}", msg),
        }
    }

    Ok(())
}
