use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::PathBuf;

use rox as lox;

use clap::error::ErrorKind;
use clap::Parser as ClapParser;

use lox::ast_printer::AstPrinter;
use lox::lox::{exit_code, Lox};
use lox::parser::Parser;
use lox::scanner::Scanner;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to run; starts an interactive prompt when omitted
    filename: Option<PathBuf>,

    /// Print the token stream instead of executing
    #[arg(long)]
    tokenize: bool,

    /// Print the parsed syntax tree instead of executing
    #[arg(long)]
    print_ast: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }

        Err(e) => {
            e.print()?;
            std::process::exit(exit_code::USAGE);
        }
    };

    if args.tokenize || args.print_ast {
        let buf: Vec<u8> = match args.filename {
            Some(filename) => read_source(&filename),

            None => {
                println!("No input filepath was provided. Exiting...");
                std::process::exit(exit_code::USAGE);
            }
        };

        if args.tokenize {
            tokenize(buf);
        } else {
            print_ast(buf);
        }

        return Ok(());
    }

    let mut lox: Lox<std::io::Stdout> = Lox::new(std::io::stdout());

    let code: i32 = match args.filename {
        Some(filename) => lox.run_file(&filename),

        None => lox.run_prompt(),
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

fn read_source(filename: &PathBuf) -> Vec<u8> {
    let file: File = match File::open(filename) {
        Ok(file) => file,

        Err(e) => {
            eprintln!("Error: Unable to open file {}: {}", filename.display(), e);
            std::process::exit(exit_code::NO_INPUT);
        }
    };

    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(file);

    if let Err(e) = reader.read_to_end(&mut buf) {
        eprintln!("Error: Failed to read from file {}: {}", filename.display(), e);
        std::process::exit(exit_code::IO_ERR);
    }

    buf
}

fn tokenize(buf: Vec<u8>) {
    let mut tokenized = true;

    for token in Scanner::new(buf) {
        match token {
            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        std::process::exit(exit_code::DATA_ERR);
    }
}

fn print_ast(buf: Vec<u8>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut had_error = false;

    for result in Scanner::new(buf) {
        match result {
            Ok(token) => tokens.push(token),

            Err(e) => {
                had_error = true;
                eprintln!("{}", e);
            }
        }
    }

    if had_error {
        std::process::exit(exit_code::DATA_ERR);
    }

    let mut parser = Parser::new(tokens, 0);

    match parser.parse() {
        Ok(statements) => {
            for statement in &statements {
                println!("{}", AstPrinter::print_stmt(statement));
            }
        }

        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(exit_code::DATA_ERR);
        }
    }
}
