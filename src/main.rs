mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.init_logging();
    match command_line_interface.run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}
