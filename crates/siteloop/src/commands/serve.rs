//! `siteloop serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use siteloop_config::{CliSettings, Config};
use siteloop_server::{DevServer, server_config_from_config};

use crate::browser;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Project root directory (default: config file directory or current directory).
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover siteloop.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging, including HTTP access logs.
    #[arg(short, long)]
    pub debug: bool,

    /// Open the site in a browser once the server is listening
    /// (default browser: $BROWSER, else firefox).
    #[arg(short = 'o', long = "open", value_name = "BROWSER", num_args = 0..=1)]
    open: Option<Option<String>>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the project cannot be
    /// watched, the address cannot be bound, or the watcher fails while
    /// serving.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            project_root: self.path,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let server_config = server_config_from_config(&config);

        output.status("Project", &server_config.project_dir.display().to_string());
        output.status("Output", &server_config.output_dir.display().to_string());

        if !server_config.output_dir.exists() {
            output.warning("Output directory does not exist yet, building first");
            let command = server_config.build_command();
            tokio::task::spawn_blocking(move || super::build_once(&command, &Output::new()))
                .await
                .map_err(|e| CliError::Io(std::io::Error::other(e)))??;
        }

        let server = DevServer::bind(server_config).await?;
        let url = format!("http://{}", server.local_addr()?);
        output.serving(&url);

        if let Some(requested) = self.open {
            let name = browser::choose(requested, std::env::var("BROWSER").ok());
            if let Err(e) = browser::launch(&name, &url) {
                output.warning(&format!("Could not open {name}: {e}"));
            }
        }

        server.run().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ServeArgs,
    }

    fn parse(args: &[&str]) -> ServeArgs {
        Harness::try_parse_from(std::iter::once("serve").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_open_absent() {
        assert_eq!(parse(&[]).open, None);
    }

    #[test]
    fn test_open_without_browser() {
        assert_eq!(parse(&["-o"]).open, Some(None));
        assert_eq!(parse(&["--open", "-p", "blog"]).open, Some(None));
    }

    #[test]
    fn test_open_with_browser() {
        assert_eq!(
            parse(&["-o", "chromium"]).open,
            Some(Some("chromium".to_owned()))
        );
    }

    #[test]
    fn test_overrides() {
        let args = parse(&["-p", "blog", "--host", "0.0.0.0", "--port", "9000", "-d"]);
        assert_eq!(args.path, Some(PathBuf::from("blog")));
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(9000));
        assert!(args.debug);
    }
}
