use std::process::ExitCode;

mod app;

use app::bootstrap::{self, Launch};

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match bootstrap::build_app(&args) {
        Ok(Launch::Run(app)) => app::loop_runner::run(app),
        Ok(Launch::PrintHelp) => {
            println!("{}", bootstrap::usage());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            if err.is_usage() {
                eprintln!("{}", bootstrap::usage());
            }
            ExitCode::from(2)
        }
    }
}
