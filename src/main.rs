//! Thin line-oriented driver: reads a script file (given as the first
//! argument) or stdin, feeds the whole buffer to a `Session`, and writes
//! command output to stdout.

use std::env;
use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::process::ExitCode;

use xbase3::{Session, SessionConfig};

fn main() -> ExitCode {
    env_logger::init();

    let config = match env::var("XBASE3_CONFIG") {
        Ok(path) => match SessionConfig::load(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("xbase3: could not load config {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => SessionConfig::default(),
    };

    let src = match env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("xbase3: {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buf) {
                eprintln!("xbase3: reading stdin: {e}");
                return ExitCode::FAILURE;
            }
            buf
        }
    };

    let mut session = Session::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut input = BufReader::new(io::stdin());

    if let Err(e) = session.run(&src, &mut out, &mut input) {
        let _ = out.flush();
        eprintln!("xbase3: {e}");
        return ExitCode::FAILURE;
    }
    let _ = out.flush();
    ExitCode::SUCCESS
}
