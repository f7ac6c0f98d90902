//! Build command invocation with live output pass-through.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::BuildError;

/// The site generator, run as an opaque subprocess.
#[derive(Clone, Debug)]
pub struct BuildCommand {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

/// Outcome of one completed build process.
#[derive(Clone, Copy, Debug)]
pub struct BuildReport {
    /// Exit status of the build tool.
    pub status: ExitStatus,
    /// Wall time from spawn to exit.
    pub elapsed: Duration,
}

impl BuildReport {
    /// Whether the build tool exited successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

impl BuildCommand {
    /// Create a command that runs `program args...` inside `cwd`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.into(),
        }
    }

    /// Program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Working directory.
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Command line for display (e.g., "make html").
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, copying stdout and stderr into `sink` line by line
    /// as they are produced.
    ///
    /// Lines are forwarded byte for byte. A non-zero exit is reported in the
    /// returned [`BuildReport`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Spawn`] if the program cannot be started and
    /// [`BuildError::Io`] if waiting on it fails.
    pub fn run<W: Write + Send>(&self, sink: &Mutex<W>) -> Result<BuildReport, BuildError> {
        let started = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BuildError::Spawn {
                command: self.display(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        std::thread::scope(|scope| {
            if let Some(stderr) = stderr {
                scope.spawn(|| forward_lines(stderr, sink));
            }
            if let Some(stdout) = stdout {
                forward_lines(stdout, sink);
            }
        });

        let status = child.wait()?;

        Ok(BuildReport {
            status,
            elapsed: started.elapsed(),
        })
    }
}

/// Copy `reader` into `sink` one line at a time until EOF.
///
/// Keeps draining after a sink write failure so the child never blocks on a
/// full pipe.
fn forward_lines<R: Read, W: Write>(reader: R, sink: &Mutex<W>) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let mut sink = sink.lock().unwrap();
                if let Err(e) = sink.write_all(&line).and_then(|()| sink.flush()) {
                    tracing::debug!(error = %e, "Failed to forward build output");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read build output");
                break;
            }
        }
    }
}
