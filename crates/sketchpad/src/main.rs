use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    app::run(app::bootstrap::build_app())
}
