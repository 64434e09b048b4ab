use std::process::ExitCode;

fn main() -> ExitCode {
    match gl_unprotect::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            gl_unprotect::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
