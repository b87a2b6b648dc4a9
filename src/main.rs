use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use veery::ast_printer::AstPrinter;
use veery::error::VeeryError;
use veery::interpreter::Interpreter;
use veery::parser::Parser;
use veery::scanner::Scanner;
use veery::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Veery language interpreter", long_about = None)]
pub struct Cli {
    /// Without a subcommand, start the interactive prompt.
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable debug logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit tokens as JSON, one object per line
        #[arg(long)]
        json: bool,
    },

    /// Parses a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a file as a Veery program
    Run { filename: PathBuf },
}

/// Reads the contents of a file into a Vec<u8>.
fn read_file(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // One line per record: local timestamp, originating module (crate prefix
    // stripped), source line.
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("veery::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));

            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

/// Exit code for a failed run: 70 when execution started and hit a runtime
/// error, 65 for any static (lex/parse/resolve) diagnostic.
fn exit_code(errors: &[VeeryError]) -> i32 {
    if errors.iter().any(VeeryError::is_runtime) {
        70
    } else {
        65
    }
}

fn report(errors: &[VeeryError]) {
    for error in errors {
        eprintln!("{}", error);
    }
}

/// Interactive prompt: one pipeline run per line against a persistent
/// interpreter. Bindings survive between lines; error state does not.
fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");

    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break; // EOF ends the session
        };
        let line = line.context("Failed to read line from stdin")?;

        if let Err(errors) = veery::run(line.as_bytes(), &mut interpreter) {
            report(&errors);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        // Minimal logger so log macros have a sink.
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let Some(command) = args.commands else {
        return run_prompt();
    };

    match command {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");

            let buf = read_file(&filename)?;
            let mut tokenized = true;

            for result in Scanner::new(&buf) {
                match result {
                    Ok(token) => {
                        debug!("Scanned token: {}", token);

                        if json {
                            println!("{}", serde_json::to_string(&token)?);
                        } else {
                            println!("{}", token);
                        }
                    }

                    Err(e) => {
                        tokenized = false;

                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");

            let buf = read_file(&filename)?;
            let (tokens, errors) = scan_all(&buf);

            if !errors.is_empty() {
                report(&errors);
                std::process::exit(65);
            }

            match Parser::new(&tokens).parse_expression() {
                Ok(expr) => {
                    let ast = AstPrinter::print(&expr);

                    debug!("AST: {}", ast);
                    println!("{}", ast);
                }

                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            }
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");

            let buf = read_file(&filename)?;
            let (tokens, errors) = scan_all(&buf);

            if !errors.is_empty() {
                report(&errors);
                std::process::exit(65);
            }

            let mut interpreter = Interpreter::new();

            match Parser::new(&tokens).parse_expression() {
                Ok(expr) => match interpreter.evaluate(&expr) {
                    Ok(value) => {
                        println!("{}", value);
                    }

                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(70);
                    }
                },

                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");

            let buf = read_file(&filename)?;
            let mut interpreter = Interpreter::new();

            if let Err(errors) = veery::run(&buf, &mut interpreter) {
                report(&errors);
                std::process::exit(exit_code(&errors));
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}

/// Collect every token and every lex error from `source`.
fn scan_all(source: &[u8]) -> (Vec<Token>, Vec<VeeryError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    (tokens, errors)
}
