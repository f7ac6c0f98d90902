//! Browser launch for `serve --open`.

use std::process::{Command, Stdio};

/// Browser used when neither `--open <BROWSER>` nor `$BROWSER` names one.
const FALLBACK_BROWSER: &str = "firefox";

/// Pick the browser program to launch.
///
/// An explicit name wins, then the first entry of `$BROWSER`, then
/// [`FALLBACK_BROWSER`].
pub(crate) fn choose(explicit: Option<String>, env: Option<String>) -> String {
    explicit
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            env.and_then(|value| {
                value
                    .split(':')
                    .map(str::trim)
                    .find(|entry| !entry.is_empty())
                    .map(ToOwned::to_owned)
            })
        })
        .unwrap_or_else(|| FALLBACK_BROWSER.to_owned())
}

/// Open `url` in `browser`.
///
/// Spawns the named program directly. If that fails, falls back to the
/// platform's default browser.
///
/// # Errors
///
/// Returns the fallback's error if neither launch works.
pub(crate) fn launch(browser: &str, url: &str) -> std::io::Result<()> {
    let spawned = Command::new(browser)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(mut child) => {
            tracing::debug!(browser, url, "Launched browser");
            std::thread::spawn(move || child.wait());
            Ok(())
        }
        Err(e) => {
            tracing::debug!(browser, error = %e, "Browser not startable, using system default");
            webbrowser::open(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_choose_explicit_wins() {
        assert_eq!(
            choose(Some("chromium".to_owned()), Some("lynx".to_owned())),
            "chromium"
        );
    }

    #[test]
    fn test_choose_env_when_no_explicit() {
        assert_eq!(choose(None, Some("lynx".to_owned())), "lynx");
    }

    #[test]
    fn test_choose_first_env_entry() {
        assert_eq!(choose(None, Some(":w3m:lynx".to_owned())), "w3m");
    }

    #[test]
    fn test_choose_fallback() {
        assert_eq!(choose(None, None), "firefox");
        assert_eq!(choose(Some(String::new()), Some("  ".to_owned())), "firefox");
    }
}
