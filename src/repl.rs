//! Interactive shell. Input accumulates across lines until its brackets are
//! balanced, then runs in a root scope that persists for the session.

use colored::Colorize;
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{builtins, scope::Scope, value::RuntimeValue, Dump};

pub struct Repl {
    scope: Scope,
    editor: DefaultEditor,
    dump: Dump,
}

impl Repl {
    pub fn new(dump: Dump) -> rustyline::Result<Self> {
        let editor = DefaultEditor::new()?;
        Ok(Repl {
            scope: fresh_scope(),
            editor,
            dump,
        })
    }

    fn show_banner(&self) {
        println!(
            "{} {}",
            "marsh".bright_cyan().bold(),
            env!("CARGO_PKG_VERSION").dimmed()
        );
        println!(
            "  Type {} for commands, {} to leave.",
            ":help".bright_yellow(),
            ":quit".bright_yellow()
        );
        println!();
    }

    pub fn run(&mut self) -> rustyline::Result<()> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "marsh> ".bright_green().to_string()
            } else {
                "....> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    let trimmed = line.trim();
                    if buffer.is_empty() && (trimmed.starts_with(':') || trimmed == "exit") {
                        if self.handle_command(trimmed) {
                            continue;
                        }
                        break;
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (:quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// Returns false when the session should end.
    fn handle_command(&mut self, command: &str) -> bool {
        match command {
            ":help" | ":h" => self.show_help(),
            ":quit" | ":q" | "exit" => return false,
            ":vars" | ":v" => self.show_variables(),
            ":reset" | ":r" => {
                self.scope = fresh_scope();
                println!("{}", "scope reset".bright_green());
            }
            _ => println!(
                "{} unknown command {}, try {}",
                "error:".bright_red(),
                command.bright_yellow(),
                ":help".bright_yellow()
            ),
        }

        true
    }

    fn show_help(&self) {
        println!("  {}   show this message", ":help".bright_yellow());
        println!("  {}   leave the shell (also {})", ":quit".bright_yellow(), "exit".bright_yellow());
        println!("  {}   list the bindings of the root scope", ":vars".bright_yellow());
        println!("  {}  start over with a fresh root scope", ":reset".bright_yellow());
        println!();
        println!("  Leave a brace, bracket or parenthesis open to continue on the next line.");
    }

    fn show_variables(&self) {
        for name in self.scope.names() {
            if let Some(binding) = self.scope.binding(&name) {
                println!("  {}", binding);
            }
        }
    }

    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        match crate::run_with(input, &self.scope, self.dump) {
            Ok(RuntimeValue::Null) => println!("{}", "null".dimmed()),
            Ok(value) => println!("{}", value),
            Err(err) => eprint!("{}", err.render(input)),
        }
    }
}

fn fresh_scope() -> Scope {
    let scope = Scope::new();
    if let Err(err) = builtins::setup_scope(&scope) {
        // only reachable if seeding names collide
        tracing::error!(%err, "failed to seed root scope");
    }
    scope
}

/// Whether every bracket opened in `input` has been closed. Comments are
/// skipped so a bracket inside one does not hold the prompt open.
fn is_input_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            _ => {}
        }
    }

    // extra closers are left for the parser to report
    depth <= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_input_is_complete() {
        assert!(is_input_complete("1 + 2\n"));
        assert!(is_input_complete("func f(a) { a }\n"));
        assert!(is_input_complete("\n"));
        assert!(is_input_complete("1)\n"));
    }

    #[test]
    fn open_brackets_continue() {
        assert!(!is_input_complete("func f(a) {\n"));
        assert!(!is_input_complete("f(1,\n"));
        assert!(!is_input_complete("o[\n"));
    }

    #[test]
    fn brackets_in_comments_are_ignored() {
        assert!(is_input_complete("1 // {\n"));
        assert!(!is_input_complete("{ // }\n"));
    }

    #[test]
    fn fresh_scope_is_seeded() {
        let scope = fresh_scope();
        assert_eq!(scope.lookup("true").unwrap(), RuntimeValue::Boolean(true));
        assert!(scope.parent().is_none());
    }
}
