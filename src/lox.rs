//! Driver glue: file mode, the interactive prompt, error reporting, and
//! process exit codes.
//!
//! The driver owns the `had_error` / `had_runtime_error` flags. A static
//! error in any pass (scan, parse, resolve) suppresses every later phase;
//! the REPL resets the flag between lines so a mistake doesn't kill the
//! session.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Exit codes after file mode, following BSD `sysexits.h`.
pub mod exit_code {
    /// Invalid command line.
    pub const USAGE: i32 = 64;

    /// Lexical, syntactic, or resolution error.
    pub const DATA_ERR: i32 = 65;

    /// Script file missing or unreadable.
    pub const NO_INPUT: i32 = 66;

    /// Runtime error.
    pub const SOFTWARE: i32 = 70;

    /// Read failure on an opened file.
    pub const IO_ERR: i32 = 74;
}

pub struct Lox<W: Write> {
    interpreter: Interpreter<W>,
    had_error: bool,
    had_runtime_error: bool,
    // Expression ids must stay unique across REPL lines: closures defined on
    // earlier lines keep their resolution entries alive.
    next_expr_id: usize,
}

impl<W: Write> Lox<W> {
    /// A driver whose `print` output goes to `output`. Diagnostics go to
    /// standard error.
    pub fn new(output: W) -> Self {
        Lox {
            interpreter: Interpreter::new(output),
            had_error: false,
            had_runtime_error: false,
            next_expr_id: 0,
        }
    }

    /// Read and interpret a script; returns the process exit code.
    pub fn run_file(&mut self, path: &Path) -> i32 {
        info!("Running file {}", path.display());

        let file: File = match File::open(path) {
            Ok(file) => file,

            Err(e) => {
                eprintln!("Error: Unable to open file {}: {}", path.display(), e);
                return exit_code::NO_INPUT;
            }
        };

        let mut buf: Vec<u8> = Vec::new();
        let mut reader: BufReader<File> = BufReader::new(file);

        if let Err(e) = reader.read_to_end(&mut buf) {
            eprintln!("Error: Failed to read from file {}: {}", path.display(), e);
            return exit_code::IO_ERR;
        }

        self.run(buf);

        if self.had_error {
            return exit_code::DATA_ERR;
        }

        if self.had_runtime_error {
            return exit_code::SOFTWARE;
        }

        0
    }

    /// Interactive prompt: one line at a time until EOF. Globals and
    /// resolution state persist across lines.
    pub fn run_prompt(&mut self) -> i32 {
        info!("Starting interactive prompt");

        let stdin = io::stdin();
        let mut line = String::new();

        loop {
            print!("> ");
            let _ = io::stdout().flush();

            line.clear();

            match stdin.lock().read_line(&mut line) {
                Ok(0) => break,

                Ok(_) => {}

                Err(e) => {
                    eprintln!("Error: Failed to read from stdin: {}", e);
                    return exit_code::IO_ERR;
                }
            }

            self.run(line.clone().into_bytes());

            // A mistake shouldn't kill the session.
            self.had_error = false;
        }

        0
    }

    /// Scan → parse → resolve → interpret. Each pass runs only if every
    /// earlier pass was clean.
    pub fn run(&mut self, source: Vec<u8>) {
        let mut tokens: Vec<Token> = Vec::new();

        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),

                Err(e) => self.report(&e),
            }
        }

        if self.had_error {
            return;
        }

        let mut parser = Parser::new(tokens, self.next_expr_id);

        let statements = match parser.parse() {
            Ok(statements) => statements,

            Err(e) => {
                self.report(&e);
                return;
            }
        };

        self.next_expr_id = parser.next_id();

        if let Err(e) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.report(&e);
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            debug!("Runtime error: {}", e);

            eprintln!("{}", e);
            self.had_runtime_error = true;
        }
    }

    fn report(&mut self, error: &LoxError) {
        eprintln!("{}", error);
        self.had_error = true;
    }
}
