use std::{env, process};

use reminder_core::{cli, init};

fn main() {
    init();

    if let Err(err) = cli::run(env::args().skip(1)) {
        cli::output::error(format!("Error: {err}"));
        process::exit(1);
    }
}
