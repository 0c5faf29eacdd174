mod demo;

use clap::Parser;
use std::process::ExitCode;
use yansi::Paint;

use crate::demo::Demo;

fn main() -> ExitCode {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
    let demo = Demo::parse();

    match demo.run() {
        Err(err) => {
            let root = err.root_cause();

            eprintln!("{}", format!("Error: {}", err).red());
            eprintln!();
            eprintln!("{}", "Caused by:".red());
            eprintln!("{}", format!("  {}", root).red());
            ExitCode::from(1)
        }
        Ok(_) => ExitCode::from(0),
    }
}
