//! Runs the interpreter under test on a single script.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::annotation::{normalize_newlines, Stream};
use crate::error::{HarnessError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long readers may keep going once the child has been reaped.
const READER_GRACE: Duration = Duration::from_millis(500);

/// What the interpreter printed for one script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Set when the harness killed the child at its deadline.
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Captured text for one stream.
    pub fn get(&self, stream: Stream) -> &str {
        match stream {
            Stream::Stdout => &self.stdout,
            Stream::Stderr => &self.stderr,
        }
    }
}

/// Spawns the binary under test with a script path as its only argument.
#[derive(Debug, Clone)]
pub struct Executor {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Kill children that are still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs the binary on `script` and captures both output streams.
    ///
    /// The child inherits the environment and working directory of the
    /// harness. Its stdin is closed. Both pipes are drained on their own
    /// threads while waiting so a child that fills one pipe cannot stall.
    ///
    /// With a timeout, the child leads its own process group so that any
    /// processes it started are killed with it at the deadline.
    pub fn run(&self, script: &Path) -> Result<ExecutionResult> {
        debug!(binary = %self.binary.display(), script = %script.display(), "spawning interpreter");
        let mut command = Command::new(&self.binary);
        command
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if self.timeout.is_some() {
                command.process_group(0);
            }
        }
        let mut child = command.spawn().map_err(|source| HarnessError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(limit) = self.timeout else {
            let status = child.wait().map_err(|source| self.wait_error(source))?;
            let stdout = collect(stdout, None).map_err(|source| self.wait_error(source))?;
            let stderr = collect(stderr, None).map_err(|source| self.wait_error(source))?;
            return Ok(self.finish(stdout, stderr, status, false));
        };

        let deadline = Instant::now() + limit;
        let (status, mut timed_out) = self
            .wait_with_deadline(&mut child, deadline, limit)
            .map_err(|source| self.wait_error(source))?;

        // Leftover processes may still hold the pipes after the child is gone.
        let reader_deadline = deadline.max(Instant::now()) + READER_GRACE;
        let stdout = collect(stdout, Some(reader_deadline)).map_err(|source| self.wait_error(source))?;
        let stderr = collect(stderr, Some(reader_deadline)).map_err(|source| self.wait_error(source))?;
        if stdout.is_none() || stderr.is_none() {
            warn!(
                binary = %self.binary.display(),
                "output pipes still open after the interpreter exited, killing its process group"
            );
            kill_group(&mut child);
            timed_out = true;
        }
        Ok(self.finish(stdout, stderr, status, timed_out))
    }

    fn finish(
        &self,
        stdout: Option<String>,
        stderr: Option<String>,
        status: ExitStatus,
        timed_out: bool,
    ) -> ExecutionResult {
        debug!(code = ?status.code(), timed_out, "interpreter finished");
        ExecutionResult {
            stdout: stdout.unwrap_or_default(),
            stderr: stderr.unwrap_or_default(),
            exit_code: status.code(),
            timed_out,
        }
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        deadline: Instant,
        limit: Duration,
    ) -> io::Result<(ExitStatus, bool)> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok((status, false));
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    binary = %self.binary.display(),
                    timeout = ?limit,
                    "interpreter exceeded its time limit, killing it"
                );
                kill_group(child);
                let status = child.wait()?;
                return Ok((status, true));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn wait_error(&self, source: io::Error) -> HarnessError {
        HarnessError::Wait {
            binary: self.binary.clone(),
            source,
        }
    }
}

/// Kills the child and everything in its process group.
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    // A negative pid addresses the group the child leads.
    let pgid = -(child.id() as libc::pid_t);
    if unsafe { libc::kill(pgid, libc::SIGKILL) } != 0 {
        // The child may exit on its own between try_wait and kill.
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
}

type Drain = Option<Receiver<io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let result = pipe.read_to_end(&mut buffer).map(|_| buffer);
            let _ = tx.send(result);
        });
        rx
    })
}

/// Waits for a reader to hit end of file. Returns `None` if `deadline`
/// passes first; the reader thread is then left to finish on its own.
fn collect(rx: Drain, deadline: Option<Instant>) -> io::Result<Option<String>> {
    let Some(rx) = rx else {
        return Ok(Some(String::new()));
    };
    let received = match deadline {
        None => rx.recv().map_err(|_| reader_died()),
        Some(deadline) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(reader_died()),
        },
    };
    let bytes = received??;
    Ok(Some(normalize_newlines(&String::from_utf8_lossy(&bytes))))
}

fn reader_died() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "output reader thread panicked")
}
