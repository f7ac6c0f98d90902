//! CLI error types.

use siteloop_build::BuildError;
use siteloop_config::ConfigError;
use siteloop_server::ServerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("Build failed ({})", exit_description(*.code))]
    BuildFailed { code: Option<i32> },
}

fn exit_description(code: Option<i32>) -> String {
    code.map_or_else(
        || "terminated by signal".to_owned(),
        |code| format!("exit status {code}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_failed_message() {
        assert_eq!(
            CliError::BuildFailed { code: Some(2) }.to_string(),
            "Build failed (exit status 2)"
        );
        assert_eq!(
            CliError::BuildFailed { code: None }.to_string(),
            "Build failed (terminated by signal)"
        );
    }
}
