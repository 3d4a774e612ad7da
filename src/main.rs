use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::path::PathBuf;
use std::process;

use treelox as lox;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use log::info;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::stmt::Stmt;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for the Lox language", long_about = None)]
pub struct Cli {
    /// Lox source file to run; starts a REPL when omitted
    script: Option<PathBuf>,

    /// Print the scanned token stream instead of executing
    #[arg(long)]
    tokens: bool,

    /// Print the parsed program in prefix form instead of executing
    #[arg(long)]
    ast: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli: Cli = match Cli::try_parse() {
        Ok(cli) => cli,

        Err(e) => {
            let usage_ok: bool = matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );

            e.print()?;

            if usage_ok {
                return Ok(());
            }

            process::exit(64);
        }
    };

    match cli.script {
        Some(path) => run_file(&path, cli.tokens, cli.ast),

        None => run_prompt(),
    }
}

fn run_file(path: &Path, dump_tokens: bool, dump_ast: bool) -> anyhow::Result<()> {
    info!("running file {}", path.display());

    let mut buf: Vec<u8> = Vec::new();

    let mut reader: BufReader<File> = BufReader::new(
        File::open(path).with_context(|| format!("could not open {}", path.display()))?,
    );

    reader.read_to_end(&mut buf)?;

    let (tokens, scan_errors) = scan(buf);

    for e in &scan_errors {
        eprintln!("{}", e);
    }

    if dump_tokens {
        for token in &tokens {
            println!("{}", token);
        }

        if !scan_errors.is_empty() {
            process::exit(65);
        }

        return Ok(());
    }

    // The parser runs even after scan errors so that one bad character
    // does not suppress syntax diagnostics further down the file.
    let mut parser: Parser = Parser::new(tokens);

    let statements: Vec<Stmt> = match parser.parse() {
        Ok(statements) => statements,

        Err(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }

            process::exit(65);
        }
    };

    if !scan_errors.is_empty() {
        process::exit(65);
    }

    if dump_ast {
        println!("{}", AstPrinter::print_program(&statements));

        return Ok(());
    }

    let mut interpreter: Interpreter = Interpreter::new();

    if let Err(errors) = Resolver::new(&mut interpreter).resolve(&statements) {
        for e in errors {
            eprintln!("{}", e);
        }

        process::exit(65);
    }

    if let Err(e) = interpreter.interpret(&statements) {
        eprintln!("{}", e);

        process::exit(e.exit_code());
    }

    Ok(())
}

/// Interactive loop. One interpreter lives across lines, so definitions
/// persist; a bad line only poisons itself because the pipeline runs
/// fresh per line. The id counter is threaded through so resolved
/// expressions from different lines never collide in the side table.
fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let mut interpreter: Interpreter = Interpreter::new();
    let mut next_id: u32 = 0;

    let mut line: String = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();

        if input.read_line(&mut line)? == 0 {
            // EOF.
            return Ok(());
        }

        let mut source: String = line.trim_end().to_string();

        if source.is_empty() {
            continue;
        }

        // Let `print 1 + 2` work without the trailing semicolon.
        if !source.ends_with(';') && !source.ends_with('}') {
            source.push(';');
        }

        run_line(&source, &mut interpreter, &mut next_id);
    }
}

fn run_line(source: &str, interpreter: &mut Interpreter, next_id: &mut u32) {
    let (tokens, scan_errors) = scan(source.as_bytes().to_vec());

    let had_scan_error: bool = !scan_errors.is_empty();

    for e in &scan_errors {
        eprintln!("{}", e);
    }

    let mut parser: Parser = Parser::with_id_offset(tokens, *next_id);

    let parsed = parser.parse();

    *next_id = parser.next_id();

    let statements: Vec<Stmt> = match parsed {
        Ok(statements) => statements,

        Err(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }

            return;
        }
    };

    if had_scan_error {
        return;
    }

    if let Err(errors) = Resolver::new(interpreter).resolve(&statements) {
        for e in errors {
            eprintln!("{}", e);
        }

        return;
    }

    if let Err(e) = interpreter.interpret(&statements) {
        eprintln!("{}", e);
    }
}

fn scan(buf: Vec<u8>) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for item in Scanner::new(buf) {
        match item {
            Ok(token) => tokens.push(token),

            Err(e) => errors.push(e),
        }
    }

    (tokens, errors)
}
