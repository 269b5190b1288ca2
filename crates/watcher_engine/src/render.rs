use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use tokio::process::Command;
use url::Url;

use crate::{FailureKind, FetchError, StartupError};

/// Produces the rendered DOM of a page.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, FetchError>;

    /// Checks the engine can be used at all. Called once at startup.
    async fn probe(&self) -> Result<(), StartupError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ChromeSettings {
    pub executable: PathBuf,
    /// Virtual time the page gets to run scripts before the DOM is dumped.
    pub settle_delay: Duration,
    pub extra_args: Vec<String>,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("chromium"),
            settle_delay: Duration::from_secs(3),
            extra_args: Vec::new(),
        }
    }
}

/// Renders through a headless Chromium process.
///
/// Each render gets its own process and a throw-away profile directory.
/// Both are released when `render` returns or its future is dropped: the
/// child is spawned with `kill_on_drop` and the profile is a `TempDir`.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    settings: ChromeSettings,
}

impl ChromeRenderer {
    pub fn new(settings: ChromeSettings) -> Self {
        Self { settings }
    }

    fn executable(&self) -> String {
        self.settings.executable.display().to_string()
    }

    fn command(&self, url: &Url, profile: &tempfile::TempDir, timeout: Duration) -> Command {
        let mut command = Command::new(&self.settings.executable);
        command
            .args([
                "--headless=new",
                "--disable-gpu",
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--no-first-run",
                "--mute-audio",
            ])
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg(format!(
                "--virtual-time-budget={}",
                self.settings.settle_delay.as_millis()
            ))
            .arg(format!("--timeout={}", timeout.as_millis()))
            .args(&self.settings.extra_args)
            .arg("--dump-dom")
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait::async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, FetchError> {
        let profile = tempfile::Builder::new()
            .prefix("watcher-chrome-")
            .tempdir()
            .map_err(|err| FetchError::new(FailureKind::Engine, format!("profile dir: {err}")))?;

        let child = self.command(url, &profile, timeout).spawn().map_err(|err| {
            FetchError::new(
                FailureKind::Engine,
                format!("failed to launch {}: {err}", self.executable()),
            )
        })?;
        engine_debug!("Launched {} pid={:?} for {}", self.executable(), child.id(), url);

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|err| FetchError::new(FailureKind::Engine, err.to_string()))?
            }
            Err(_) => {
                return Err(FetchError::new(
                    FailureKind::Timeout,
                    format!("no DOM from {} within {timeout:?}", url),
                ));
            }
        };

        if let Err(err) = profile.close() {
            engine_warn!("Failed to remove browser profile: {}", err);
        }

        let dom = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() && !dom.trim().is_empty() {
            return Ok(dom);
        }

        // No usable DOM. Subresource failures are only console noise; a
        // net error outside a console line is the page itself failing.
        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(code) = network_error_code(&stderr) {
            return Err(FetchError::new(FailureKind::Network, code));
        }
        if !output.status.success() {
            return Err(FetchError::new(
                FailureKind::Engine,
                format!("{} exited with {}", self.executable(), output.status),
            ));
        }
        Err(FetchError::new(FailureKind::Navigation, "empty DOM"))
    }

    async fn probe(&self) -> Result<(), StartupError> {
        let unavailable = |reason: String| StartupError::EngineUnavailable {
            executable: self.executable(),
            reason,
        };
        let mut command = Command::new(&self.settings.executable);
        command
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(30), command.output())
            .await
            .map_err(|_| unavailable("--version timed out".to_string()))?
            .map_err(|err| unavailable(err.to_string()))?;
        if !output.status.success() {
            return Err(unavailable(format!("--version exited with {}", output.status)));
        }
        engine_debug!(
            "Rendering engine: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}

/// Chromium reports load failures as `net::ERR_*` on stderr. Lines relayed
/// from the page console are skipped.
fn network_error_code(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .filter(|line| !line.contains("CONSOLE"))
        .find_map(|line| {
            let start = line.find("net::ERR_")?;
            let code: String = line[start..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ':')
                .collect();
            Some(code)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_chromium_network_errors() {
        let stderr = "[1016/120000.1:ERROR:foo.cc(1)] load failed: net::ERR_NAME_NOT_RESOLVED (-105)";
        assert_eq!(
            network_error_code(stderr).as_deref(),
            Some("net::ERR_NAME_NOT_RESOLVED")
        );
        assert_eq!(network_error_code("all good"), None);
    }

    #[test]
    fn console_lines_are_not_load_failures() {
        let stderr = "[1016/120000.1:INFO:CONSOLE(0)] \"Failed to load resource: net::ERR_BLOCKED_BY_CLIENT\"\n\
                      [1016/120000.2:ERROR:foo.cc(1)] net::ERR_CONNECTION_RESET";
        assert_eq!(
            network_error_code(stderr).as_deref(),
            Some("net::ERR_CONNECTION_RESET")
        );
    }
}
