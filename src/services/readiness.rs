//! Watching the dashboard's log stream for its readiness marker.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Substring the dashboard prints once its web server is up.
pub const READY_MARKER: &str = "Entrypoint";

/// Lines containing any of these are echoed to the operator.
pub const ECHO_MARKERS: &[&str] = &["info", "error", "warn", READY_MARKER];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReadinessError {
    #[error("Dashboard did not report readiness within {0:?}")]
    Timeout(Duration),

    #[error("Dashboard output ended before it reported readiness")]
    StreamClosed,

    #[error("Waiting for the dashboard was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// Process started, nobody is reading its output yet.
    Spawned,
    AwaitingMarker,
    /// Terminal. Later matches don't resolve again.
    Ready,
}

/// What to do with one line of dashboard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Text to show the operator, if any.
    pub display: Option<String>,
    /// True only for the line that made the probe ready.
    pub ready: bool,
}

type Matcher = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Line-by-line readiness state machine.
pub struct ReadinessProbe {
    state: ReadinessState,
    matcher: Matcher,
    echo_width: usize,
    verbose: bool,
}

impl fmt::Debug for ReadinessProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessProbe")
            .field("state", &self.state)
            .field("echo_width", &self.echo_width)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl ReadinessProbe {
    /// A probe waiting for [`READY_MARKER`].
    ///
    /// In `verbose` mode every line is relayed in full instead of only the
    /// truncated marker lines.
    pub fn new(echo_width: usize, verbose: bool) -> Self {
        Self {
            state: ReadinessState::Spawned,
            matcher: Box::new(|line| line.contains(READY_MARKER)),
            echo_width,
            verbose,
        }
    }

    pub fn with_matcher<F>(self, matcher: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            matcher: Box::new(matcher),
            ..self
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ReadinessState::Ready
    }

    /// Mark the start of reading. No-op once past `Spawned`.
    pub fn start(&mut self) {
        if self.state == ReadinessState::Spawned {
            self.state = ReadinessState::AwaitingMarker;
        }
    }

    pub fn observe(&mut self, line: &str) -> Observation {
        self.start();

        let display = if self.verbose {
            Some(line.to_string())
        } else if ECHO_MARKERS.iter().any(|marker| line.contains(marker)) {
            Some(truncate(line, self.echo_width))
        } else {
            None
        };

        let ready = self.state == ReadinessState::AwaitingMarker && (self.matcher)(line);
        if ready {
            self.state = ReadinessState::Ready;
        }

        Observation { display, ready }
    }
}

fn truncate(line: &str, width: usize) -> String {
    line.chars().take(width).collect()
}

/// Feed `lines` through `probe` until it becomes ready.
///
/// `display` receives every line the probe wants shown. `timeout` of `None`
/// waits forever. A `true` on `cancel` stops the wait; a dropped sender is
/// ignored.
pub async fn wait_for_ready<F>(
    probe: &mut ReadinessProbe,
    lines: &mut mpsc::UnboundedReceiver<String>,
    timeout: Option<Duration>,
    cancel: &mut watch::Receiver<bool>,
    mut display: F,
) -> Result<(), ReadinessError>
where
    F: FnMut(&str),
{
    probe.start();
    if *cancel.borrow() {
        return Err(ReadinessError::Cancelled);
    }
    tracing::info!("Waiting for dashboard marker '{}' (timeout {:?})", READY_MARKER, timeout);

    let wait = async {
        let mut cancel_open = true;
        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        return Err(ReadinessError::StreamClosed);
                    };
                    tracing::debug!(target: "dashboard", "{}", line);

                    let observation = probe.observe(&line);
                    if let Some(text) = &observation.display {
                        display(text);
                    }
                    if observation.ready {
                        return Ok(());
                    }
                }
                changed = cancel.changed(), if cancel_open => {
                    match changed {
                        Ok(()) if *cancel.borrow() => return Err(ReadinessError::Cancelled),
                        Ok(()) => {}
                        Err(_) => cancel_open = false,
                    }
                }
            }
        }
    };

    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .unwrap_or(Err(ReadinessError::Timeout(limit))),
        None => wait.await,
    };

    match &result {
        Ok(()) => tracing::info!("Dashboard is ready"),
        Err(e) => tracing::warn!("Dashboard readiness wait failed: {}", e),
    }
    result
}

/// Keep reading the rest of the stream into the log so the child never blocks
/// on a full pipe. `relay` also prints each line.
pub fn drain_to_log(mut lines: mpsc::UnboundedReceiver<String>, relay: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = lines.recv().await {
            tracing::debug!(target: "dashboard", "{}", line);
            if relay {
                println!("{}", line);
            }
        }
        tracing::debug!("Dashboard output closed");
    })
}
