//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod serve;

pub(crate) use build::BuildArgs;
pub(crate) use serve::ServeArgs;

use std::io::Stdout;
use std::sync::Mutex;

use siteloop_build::{BuildCommand, BuildReport};

use crate::error::CliError;
use crate::output::Output;

/// Run the build once, forwarding its output to stdout.
fn build_once(command: &BuildCommand, output: &Output) -> Result<BuildReport, CliError> {
    output.status("Build", &command.display());

    let stdout: Mutex<Stdout> = Mutex::new(std::io::stdout());
    let report = command.run(&stdout)?;

    let secs = report.elapsed.as_secs_f64();
    if report.success() {
        output.success(&format!("Build finished in {secs:.2}s"));
    } else {
        output.warning(&format!(
            "Build exited with {} after {secs:.2}s",
            report
                .status
                .code()
                .map_or_else(|| "a signal".to_owned(), |code| format!("status {code}"))
        ));
    }

    Ok(report)
}
