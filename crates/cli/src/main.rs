use std::process::ExitCode;

fn main() -> ExitCode {
    wms_cli::run()
}
