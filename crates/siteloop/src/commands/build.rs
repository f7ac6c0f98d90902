//! `siteloop build` command implementation.

use std::path::PathBuf;

use clap::Args;
use siteloop_config::{CliSettings, Config};
use siteloop_server::server_config_from_config;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Project root directory (default: config file directory or current directory).
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover siteloop.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the build tool cannot be
    /// started, or it exits unsuccessfully.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            project_root: self.path,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let server_config = server_config_from_config(&config);

        output.status("Project", &server_config.project_dir.display().to_string());
        let report = super::build_once(&server_config.build_command(), &output)?;

        if report.success() {
            Ok(())
        } else {
            Err(CliError::BuildFailed {
                code: report.status.code(),
            })
        }
    }
}
