//! Cancellable fio execution
//!
//! The tool runs in its own process group with both output pipes drained
//! concurrently. Waiting for it, and for its pipes to close, races against the
//! caller's [`CancellationToken`]: if the token fires first, the whole process
//! group is killed and reaped before [`ProbeError::Cancelled`] is returned.
//! Dropping the run future kills the group as well, so no fio job processes
//! outlive the probe either way.

use crate::error::ProbeError;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const READ_CHUNK: usize = 8 << 10;

/// Captured result of a completed run
#[derive(Debug)]
pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    combined: Vec<u8>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Standard output and standard error interleaved in the order they were read
    pub fn combined(&self) -> &[u8] {
        &self.combined
    }
}

/// Sends `SIGKILL` to a process group when dropped
///
/// Held for the lifetime of a run so that every exit path, including the run
/// future being dropped by its caller, takes down the tool and anything it
/// forked.
#[derive(Debug)]
struct ProcessGroup {
    pgid: libc::pid_t,
}

impl ProcessGroup {
    fn kill(&self) {
        let result = unsafe { libc::kill(-self.pgid, libc::SIGKILL) };
        if result != 0 {
            let e = io::Error::last_os_error();
            // ESRCH: every member has already exited.
            if e.raw_os_error() != Some(libc::ESRCH) {
                debug!(pgid = self.pgid, error = %e, "failed to signal benchmark process group");
            }
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

type Drain = JoinHandle<io::Result<Vec<u8>>>;

/// Run `program` with `args` until it exits or `cancel` fires
///
/// A non-zero exit is not an error at this level; callers inspect
/// [`RunOutput::status`].
pub async fn run(program: &Path, args: &[String], cancel: &CancellationToken) -> Result<RunOutput, ProbeError> {
    let program_name = program.display().to_string();

    if cancel.is_cancelled() {
        return Err(ProbeError::Cancelled);
    }

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .process_group(0);

    let mut child = command.spawn().map_err(|source| ProbeError::Launch {
        program: program_name.clone(),
        source,
    })?;
    // The child leads its own group, so its pid is the group id.
    let group = child.id().map(|pid| ProcessGroup {
        pgid: pid as libc::pid_t,
    });
    debug!(program = %program_name, pid = ?child.id(), "spawned benchmark");

    let combined = Arc::new(Mutex::new(Vec::new()));
    let mut stdout_task = drain(child.stdout.take(), Arc::clone(&combined));
    let mut stderr_task = drain(child.stderr.take(), Arc::clone(&combined));

    let finished = tokio::select! {
        outcome = wait_and_collect(&mut child, &mut stdout_task, &mut stderr_task, &program_name) => Some(outcome),
        _ = cancel.cancelled() => None,
    };

    let (status, stdout, stderr) = match finished {
        Some(outcome) => outcome?,
        None => {
            terminate(&mut child, group.as_ref()).await;
            stdout_task.abort();
            stderr_task.abort();
            debug!(program = %program_name, "benchmark cancelled");
            return Err(ProbeError::Cancelled);
        }
    };
    debug!(program = %program_name, %status, stdout_bytes = stdout.len(), stderr_bytes = stderr.len(), "benchmark exited");

    let combined = std::mem::take(&mut *combined.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(RunOutput {
        status,
        stdout,
        stderr,
        combined,
    })
}

/// Wait for the tool to exit and for both of its pipes to reach end of file
///
/// Processes forked by the tool inherit its pipes, so the pipes may stay open
/// well after the tool itself has exited.
async fn wait_and_collect(
    child: &mut Child,
    stdout: &mut Drain,
    stderr: &mut Drain,
    program: &str,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), ProbeError> {
    let status = child.wait().await.map_err(|source| ProbeError::Output {
        program: program.to_string(),
        source,
    })?;
    let stdout = collect(stdout, program).await?;
    let stderr = collect(stderr, program).await?;
    Ok((status, stdout, stderr))
}

fn drain<R>(pipe: Option<R>, combined: Arc<Mutex<Vec<u8>>>) -> Drain
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let mut chunk = vec![0u8; READ_CHUNK];
            loop {
                let n = pipe.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..n]);
                combined
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]);
            }
        }
        Ok(buffer)
    })
}

async fn collect(task: &mut Drain, program: &str) -> Result<Vec<u8>, ProbeError> {
    let output = match task.await {
        Ok(output) => output,
        Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
    };
    output.map_err(|source| ProbeError::Output {
        program: program.to_string(),
        source,
    })
}

/// Kill the child's process group and reap the child
async fn terminate(child: &mut Child, group: Option<&ProcessGroup>) {
    // fio forks one process per job; they share the child's process group.
    if let Some(group) = group {
        group.kill();
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "failed to kill benchmark process");
    }
}
