use std::process::ExitCode;

fn main() -> ExitCode {
    let code = flowctl::cli::main();
    ExitCode::from(code.rem_euclid(256) as u8)
}
