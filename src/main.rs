// ABOUTME: CLI entry point - dispatches to file execution or the interactive REPL

use clap::Parser;
use eta::config;
use eta::driver;
use eta::rca;
use eta::scope::Scope;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::process::ExitCode;

/// eta - a small tree-walking interpreter
#[derive(Parser, Debug)]
#[command(name = "eta")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for the eta language")]
struct CliArgs {
    /// Script file to execute. If omitted, starts the REPL.
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let code = match args.script {
        Some(path) => driver::run_file(&path),
        None => {
            repl();
            0
        }
    };

    rca::purge();
    ExitCode::from(code as u8)
}

fn repl() {
    let scope = Scope::root();

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = match Editor::<(), rustyline::history::DefaultHistory>::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("eta: failed to initialize REPL: {}", e);
            return;
        }
    };

    let history_file = ".eta_history";
    let _ = rl.load_history(history_file);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);

    loop {
        let readline = rl.readline("eta> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match trimmed {
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    ":clear" => {
                        print!("\x1B[2J\x1B[H");
                        continue;
                    }
                    _ => {}
                }

                if let Some(output) = driver::repl_eval_line(&line, &scope) {
                    println!("=> {}", output);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("eta: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
}
