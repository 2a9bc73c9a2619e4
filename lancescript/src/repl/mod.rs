//! REPL (Read-Eval-Print Loop) for LanceScript
//!
//! Every entered chunk runs as a program against one long-lived
//! interpreter, so declarations survive from one line to the next.

use crate::interp::{Interpreter, InterpreterConfig};
use crate::lexer::tokenize;
use crate::parser::parse;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = "... ";
const HISTORY_FILE: &str = ".lance_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    history_path: Option<PathBuf>,
    /// Lines of a chunk whose braces are still open
    pending: String,
}

impl Repl {
    pub fn new(config: InterpreterConfig) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            interpreter: Interpreter::with_config(config),
            history_path,
            pending: String::new(),
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("LanceScript REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            let prompt = if self.pending.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    if self.pending.is_empty() && line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.pending.push_str(line);
                    self.pending.push('\n');
                    if braces_balanced(&self.pending) {
                        let chunk = std::mem::take(&mut self.pending);
                        self.eval_source(&chunk);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.pending.clear();
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :); returns true to quit
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                print_help();
                false
            }
            ":reset" => {
                self.interpreter.reset();
                println!("All declarations forgotten.");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn eval_source(&mut self, source: &str) {
        let tokens = match tokenize(source) {
            Ok(tokens) => tokens,
            Err(err) => {
                eprintln!("Lexer error: {}", err.message());
                return;
            }
        };

        match parse("<repl>", source, tokens) {
            Ok(program) => {
                if let Err(err) = self.interpreter.run(&program) {
                    eprintln!("{err}");
                }
            }
            Err(err) => {
                eprintln!("Parse error: {}", err.message());
            }
        }
    }
}

fn print_help() {
    println!("LanceScript REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!("  :reset          Forget all variables, constants and functions");
    println!();
    println!("Enter statements as in a source file:");
    println!("  int a = 4;");
    println!("  write a * 2;");
    println!("  int twice(int n) {{ write n * 2; }}");
    println!("A line with unclosed braces continues on the next line.");
}

/// True once every `{` has a matching `}`
fn braces_balanced(source: &str) -> bool {
    let mut depth: i64 = 0;
    for c in source.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        Repl::new(InterpreterConfig::default()).unwrap()
    }

    #[test]
    fn test_handle_command() {
        let mut repl = repl();
        assert!(repl.handle_command(":quit"));
        assert!(repl.handle_command(":q"));
        assert!(repl.handle_command(":exit"));
        assert!(!repl.handle_command(":help"));
        assert!(!repl.handle_command(":anything_else"));
    }

    #[test]
    fn test_declarations_persist_between_chunks() {
        let mut repl = repl();
        repl.eval_source("int a = 4;");
        repl.eval_source("const N = 2;");
        assert!(repl.interpreter.symbols().is_declared_anywhere("a"));
        assert!(repl.interpreter.symbols().is_constant("N"));
    }

    #[test]
    fn test_reset_forgets_declarations() {
        let mut repl = repl();
        repl.eval_source("int a; int f() { }");
        assert!(!repl.handle_command(":reset"));
        assert!(!repl.interpreter.symbols().is_declared_anywhere("a"));
        assert!(!repl.interpreter.symbols().is_function("f"));
        // Redeclaring after a reset is fine
        repl.eval_source("int a;");
        assert!(repl.interpreter.symbols().is_declared_anywhere("a"));
    }

    #[test]
    fn test_errors_do_not_panic() {
        let mut repl = repl();
        repl.eval_source("###");
        repl.eval_source("int ;");
        repl.eval_source("write ghost;");
    }

    #[test]
    fn test_braces_balanced() {
        assert!(braces_balanced("int a;"));
        assert!(!braces_balanced("while (1) {"));
        assert!(braces_balanced("while (1) {\n write 1; }"));
        assert!(braces_balanced("}"));
    }

    #[test]
    fn test_history_file_name() {
        let repl = repl();
        if let Some(path) = repl.history_path {
            assert!(path.to_string_lossy().contains(".lance_history"));
        }
    }
}
