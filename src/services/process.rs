use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Indentation of relayed subprocess output.
pub const RELAY_INDENT: &str = "    ";

/// Stage header shown to the operator, e.g. `Writing configuration files...`.
pub fn banner(message: &str) -> String {
    format!("\n***\n{}\n***\n", message)
}

/// Errors from spawning or supervising external programs
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to start `{command}` in {cwd}: {source}")]
    Spawn {
        command: String,
        cwd: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step '{label}' failed with {}", describe_exit(.exit_code))]
    StepFailed {
        label: String,
        exit_code: Option<i32>,
    },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Short description used in logs and warnings, e.g. `clone bcoin`.
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Utf8PathBuf,
}

impl CommandSpec {
    pub fn new(label: impl Into<String>, program: impl Into<String>, cwd: &Utf8Path) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(&self.cwd);
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a relayed step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub label: String,
    pub exit_code: Option<i32>,
}

impl StepOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a command to completion.
///
/// The seam between the fetch/install stages and the operating system.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> impl Future<Output = Result<StepOutcome, ProcessError>> + Send;
}

/// Runs commands with tokio and relays their output to the terminal, one
/// indented line at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayRunner;

impl CommandRunner for RelayRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<StepOutcome, ProcessError> {
        tracing::info!("Running `{}` in {}", spec, spec.cwd);
        let start = Instant::now();

        let mut child = spec
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: spec.to_string(),
                cwd: spec.cwd.clone(),
                source,
            })?;

        let stdout = child.stdout.take().map(|out| tokio::spawn(relay_lines(out)));
        let stderr = child.stderr.take().map(|err| tokio::spawn(relay_lines(err)));

        let status = child.wait().await.map_err(|source| ProcessError::Wait {
            command: spec.to_string(),
            source,
        })?;

        // Drain whatever is still buffered before reporting
        for pump in [stdout, stderr].into_iter().flatten() {
            if let Err(e) = pump.await {
                tracing::warn!("Output relay for `{}` ended abnormally: {}", spec, e);
            }
        }

        let exit_code = status.code();
        tracing::info!(
            "`{}` completed in {:.2}s with {}",
            spec,
            start.elapsed().as_secs_f32(),
            describe_exit(&exit_code)
        );

        Ok(StepOutcome {
            label: spec.label.clone(),
            exit_code,
        })
    }
}

/// Read one line, replacing invalid UTF-8 instead of failing on it.
///
/// # Arguments
/// * `reader` - Buffered stream to read from
/// * `buf` - Scratch buffer reused between calls
///
/// # Returns
/// The line without its `\n` or `\r\n` terminator, or `None` at end of stream
async fn next_lossy_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

// Reads until EOF so the child never writes into a closed pipe
async fn relay_lines<R: AsyncRead + Unpin>(reader: R) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match next_lossy_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => println!("{}{}", RELAY_INDENT, line),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Reading subprocess output failed: {}", e);
                break;
            }
        }
    }
}

/// Start a program that outlives the installer.
///
/// Standard streams are discarded and, on Unix, the child gets its own process
/// group so a Ctrl-C in the handoff shell doesn't reach it.
pub fn spawn_detached(spec: &CommandSpec) -> Result<Option<u32>, ProcessError> {
    let mut command = spec.command();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);

    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn().map_err(|source| ProcessError::Spawn {
        command: spec.to_string(),
        cwd: spec.cwd.clone(),
        source,
    })?;

    let pid = child.id();
    tracing::info!("Started `{}` in {} (pid {:?})", spec, spec.cwd, pid);
    Ok(pid)
}

/// Start a program and merge its stdout and stderr into one line channel.
///
/// The channel closes once both streams have ended. The child is returned so
/// the caller decides how long it lives.
pub fn spawn_with_lines(
    spec: &CommandSpec,
) -> Result<(Child, mpsc::UnboundedReceiver<String>), ProcessError> {
    let mut command = spec.command();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false);

    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        command: spec.to_string(),
        cwd: spec.cwd.clone(),
        source,
    })?;
    tracing::info!("Started `{}` in {} (pid {:?})", spec, spec.cwd, child.id());

    let (tx, rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx));
    }

    Ok((child, rx))
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, tx: mpsc::UnboundedSender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match next_lossy_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Reading subprocess output failed: {}", e);
                break;
            }
        }
    }
}
