//! Integration tests for the dashboard readiness wait
//!
//! These tests verify:
//! - Resolution on the first line containing the marker, and only once
//! - No resolution however many non-matching lines arrive
//! - Real subprocess output through the merged line channel

use ezbcoin::services::readiness::{ReadinessError, ReadinessProbe, ReadinessState, wait_for_ready};
use tokio::sync::{mpsc, watch};
use tokio_test::{assert_pending, assert_ready};

#[test]
fn test_never_resolves_without_marker() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_cancel_tx, mut cancel_rx) = watch::channel(false);
    let mut probe = ReadinessProbe::new(120, false);

    let mut wait = tokio_test::task::spawn(wait_for_ready(&mut probe, &mut rx, None, &mut cancel_rx, |_| {}));

    for batch in 0..10 {
        for i in 0..100 {
            tx.send(format!("[info] chunk {} line {} entrypoint-ish", batch, i)).unwrap();
        }
        assert_pending!(wait.poll());
    }
}

#[test]
fn test_resolves_on_first_marker_line() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_cancel_tx, mut cancel_rx) = watch::channel(false);
    let mut probe = ReadinessProbe::new(120, false);
    let mut shown = Vec::new();

    tx.send("building".to_string()).unwrap();
    tx.send("Entrypoint main [big] = main.js".to_string()).unwrap();
    tx.send("Entrypoint vendor = vendor.js".to_string()).unwrap();

    {
        let mut wait = tokio_test::task::spawn(wait_for_ready(
            &mut probe,
            &mut rx,
            None,
            &mut cancel_rx,
            |line| shown.push(line.to_string()),
        ));
        let result = assert_ready!(wait.poll());
        assert_eq!(result, Ok(()));
    }

    assert_eq!(probe.state(), ReadinessState::Ready);
    assert_eq!(shown, vec!["Entrypoint main [big] = main.js".to_string()]);

    // The second marker line is still queued for the drain
    assert_eq!(rx.try_recv().unwrap(), "Entrypoint vendor = vendor.js");
    assert!(!probe.observe("Entrypoint vendor = vendor.js").ready);
}

#[test]
fn test_cancel_already_requested() {
    let (_tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let mut probe = ReadinessProbe::new(120, false);
    let mut wait = tokio_test::task::spawn(wait_for_ready(&mut probe, &mut rx, None, &mut cancel_rx, |_| {}));
    assert_eq!(assert_ready!(wait.poll()), Err(ReadinessError::Cancelled));
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_process_output() {
    use camino::Utf8Path;
    use ezbcoin::services::process::{CommandSpec, spawn_with_lines};

    let spec = CommandSpec::new("fake dashboard", "sh", Utf8Path::new("/")).args([
        "-c",
        "echo compiling; echo 'warn: slow' 1>&2; echo 'Entrypoint main = app.js'; echo after",
    ]);
    let (mut child, mut lines) = spawn_with_lines(&spec).unwrap();
    let (_cancel_tx, mut cancel_rx) = watch::channel(false);

    let mut probe = ReadinessProbe::new(120, false);
    let result = wait_for_ready(
        &mut probe,
        &mut lines,
        Some(std::time::Duration::from_secs(10)),
        &mut cancel_rx,
        |_| {},
    )
    .await;

    assert_eq!(result, Ok(()));
    child.wait().await.unwrap();
}
