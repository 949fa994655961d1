//! Binary entrypoint for gfdl-cli (made by FontLab https://www.fontlab.com/)

use gfdl_core::errlog::{ErrorLog, Failure, FailureSink};

fn main() {
    record_panics();

    if let Err(err) = gfdl_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

/// Unexpected panics land in the error log before the default report.
fn record_panics() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(path) = ErrorLog::default_path() {
            let cause = anyhow::anyhow!("{info}");
            ErrorLog::new(path).record_failure(Failure::of_type("Unhandled panic", "panic", &*cause));
        }
        previous(info);
    }));
}
