// ABOUTME: Script-file and REPL-line evaluation entry points shared by main.rs

use crate::eval::Evaluator;
use crate::parser::Parser;
use crate::scope::Scope;
use std::path::Path;
use std::rc::Rc;

/// Reads, parses, and evaluates a whole script file against a fresh global
/// scope. Returns the process exit code: 0 on success, 1 if reading,
/// parsing, or evaluation failed.
pub fn run_file(path: &Path) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot read '{}': {}", path.display(), e);
            return 1;
        }
    };

    let filename = path.display().to_string();
    let mut parser = Parser::new(filename, source);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        for err in parser.errors() {
            eprintln!("{}", err);
        }
        return 1;
    }

    let lexer = parser.into_lexer();
    let evaluator = Evaluator::new(&lexer);
    let scope = Scope::root();
    match evaluator.eval_program(&program, &scope) {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("{}", e.message());
            1
        }
    }
}

/// Parses and evaluates one REPL line against a persistent scope. Returns
/// the text to print: parse errors joined by newlines, the evaluated
/// value's display form, or the evaluation error's message. Returns `None`
/// for input that parses to an empty program (blank lines, comments-only
/// input) since there is nothing to report.
pub fn repl_eval_line(line: &str, scope: &Rc<Scope>) -> Option<String> {
    let mut parser = Parser::new("<repl>", line);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        let messages: Vec<String> = parser.errors().iter().map(|e| e.to_string()).collect();
        return Some(messages.join("\n"));
    }
    if program.is_empty() {
        return None;
    }

    let lexer = parser.into_lexer();
    let evaluator = Evaluator::new(&lexer);
    Some(match evaluator.eval_program(&program, scope) {
        Ok(result) => result.display(),
        Err(e) => e.message().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn run_file_reports_parse_errors_and_returns_one() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "let x = ;").unwrap();
        assert_eq!(run_file(file.path()), 1);
    }

    #[test]
    fn run_file_evaluates_a_valid_script_and_returns_zero() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "let x = 1 + 2;").unwrap();
        assert_eq!(run_file(file.path()), 0);
    }

    #[test]
    fn run_file_reports_a_missing_path_and_returns_one() {
        assert_eq!(run_file(Path::new("/no/such/file.eta")), 1);
    }

    #[test]
    fn repl_eval_line_shares_state_across_calls() {
        let scope = Scope::root();
        assert_eq!(repl_eval_line("let x = 41;", &scope), Some("41".to_string()));
        assert_eq!(repl_eval_line("x + 1;", &scope), Some("42".to_string()));
    }

    #[test]
    fn repl_eval_line_returns_none_for_blank_input() {
        let scope = Scope::root();
        assert_eq!(repl_eval_line("   ", &scope), None);
    }

    #[test]
    fn repl_eval_line_reports_parse_errors() {
        let scope = Scope::root();
        let result = repl_eval_line("let = 1;", &scope);
        assert!(result.is_some());
    }
}
