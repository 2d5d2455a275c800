#[macro_use]
extern crate clap;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::process;

use clap::{Arg, ArgGroup, ErrorKind};

use ippcode22::{InputSource, Interpreter};

fn main() {
    process::exit(run());
}

/// Parses arguments, loads the program and input source, runs it, and
/// returns the process exit code. All I/O and translation of library
/// errors into that numeric contract happens here; the library crates
/// never know about exit codes themselves.
fn run() -> i32 {
    let matches = match build_app().get_matches_safe() {
        Ok(matches) => matches,
        Err(ref err) if err.kind == ErrorKind::MissingRequiredArgument => {
            eprintln!("{}", err.message);
            return 10;
        }
        Err(err) => {
            eprintln!("{}", err);
            return 1;
        }
    };

    let source_text = match read_source(matches.value_of("source")) {
        Ok(text) => text,
        Err(code) => return code,
    };

    let program = match ippcode22_xml::load_program(source_text.as_bytes()) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err);
            return err.code();
        }
    };

    let input = match open_input(matches.value_of("input")) {
        Ok(input) => input,
        Err(code) => return code,
    };

    let stdout = BufWriter::new(io::stdout());
    let mut interpreter = Interpreter::new(&program, input, Box::new(stdout));
    match interpreter.run() {
        Ok(outcome) => outcome.code(),
        Err(err) => {
            eprintln!("{}", err);
            err.code()
        }
    }
}

fn build_app() -> clap::App<'static, 'static> {
    app_from_crate!()
        .arg(
            Arg::with_name("source")
                .long("source")
                .takes_value(true)
                .value_name("FILE")
                .help("IPPcode22 XML source file (default: standard input)"),
        )
        .arg(
            Arg::with_name("input")
                .long("input")
                .takes_value(true)
                .value_name("FILE")
                .help("Input file for READ (default: standard input)"),
        )
        .group(
            ArgGroup::with_name("io")
                .args(&["source", "input"])
                .required(true)
                .multiple(true),
        )
}

fn read_source(path: Option<&str>) -> Result<String, i32> {
    let mut text = String::new();
    match path {
        Some(path) => {
            let mut file = File::open(path).map_err(|err| {
                eprintln!("cannot open source file {}: {}", path, err);
                11
            })?;
            file.read_to_string(&mut text).map_err(|err| {
                eprintln!("cannot read source file {}: {}", path, err);
                11
            })?;
        }
        None => {
            io::stdin().read_to_string(&mut text).map_err(|err| {
                eprintln!("cannot read source from standard input: {}", err);
                11
            })?;
        }
    }
    Ok(text)
}

fn open_input(path: Option<&str>) -> Result<InputSource, i32> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                eprintln!("cannot open input file {}: {}", path, err);
                11
            })?;
            Ok(InputSource::new(Box::new(BufReader::new(file))))
        }
        None => Ok(InputSource::new(Box::new(BufReader::new(io::stdin())))),
    }
}
