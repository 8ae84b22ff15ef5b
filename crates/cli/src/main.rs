use std::process::ExitCode;

fn main() -> ExitCode {
    dropshop_cli::run()
}
