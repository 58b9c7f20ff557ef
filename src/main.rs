use std::process::ExitCode;

fn main() -> ExitCode {
    loxtest::cli::run()
}
