use std::env;
use std::fs;
use std::path::Path;
use std::process;

use tally_lang::{
    config::{Command, RunConfig, USAGE},
    diagnostics,
    language::{lexer::tokenize, parser::parse_source, printer::print_unit},
    Error,
};

fn main() {
    tally_lang::init_tracing();
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("{USAGE}");
        process::exit(1);
    }

    let Some(command) = Command::from_word(&args[1]) else {
        eprintln!("Invalid command. {USAGE}");
        process::exit(1);
    };
    let filename = args[2].clone();

    if !filename.ends_with(".tly") {
        eprintln!("Invalid file extension. Only .tly files are allowed.");
        process::exit(1);
    }

    let source = match fs::read_to_string(&filename) {
        Ok(source) => source,
        Err(err) => {
            diagnostics::report_io_error(Path::new(&filename), &err);
            process::exit(1);
        }
    };
    let config = RunConfig::from_env();

    if let Err(err) = dispatch(command, &source, &filename, config) {
        diagnostics::emit_error(&filename, &source, &err);
        process::exit(1);
    }
}

fn dispatch(command: Command, source: &str, filename: &str, config: RunConfig) -> Result<(), Error> {
    tracing::debug!(%command, file = filename, "dispatch");
    match command {
        Command::Run => {
            tally_lang::load(source, filename, config)?.run()?;
        }
        Command::Check => {
            tally_lang::load(source, filename, config)?.analyze()?;
            println!("{filename}: ok");
        }
        Command::Ast => {
            let unit = parse_source(source, filename)?;
            print!("{}", print_unit(&unit));
        }
        Command::Tokens => {
            for token in tokenize(source, filename)? {
                println!("{token}");
            }
        }
    }
    Ok(())
}
