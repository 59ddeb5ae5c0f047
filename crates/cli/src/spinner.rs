//! Progress spinner on stderr
//!
//! Runs as its own task and only draws when stderr is a terminal. Stop it
//! before printing results so the line is cleared first.

use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub struct Spinner {
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        let stop = CancellationToken::new();
        if !std::io::stderr().is_terminal() {
            return Self { stop, handle: None };
        }

        let message = message.into();
        let token = stop.clone();
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(FRAME_INTERVAL);
            let mut frames = FRAMES.iter().cycle();

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(frame) = frames.next() else { break };
                        let line = format!(
                            "{frame} {message} ({:.1}s)",
                            started.elapsed().as_secs_f32()
                        );
                        if let Err(err) = draw(&line) {
                            debug!(error = %err, "Spinner stopped, stderr not writable");
                            return;
                        }
                    }
                }
            }

            if let Err(err) = draw("") {
                debug!(error = %err, "Spinner line not cleared");
            }
        });

        Self { stop, handle: Some(handle) }
    }

    /// Stop drawing and wait for the line to be cleared.
    pub async fn stop(mut self) {
        self.stop.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                debug!(error = %err, "Spinner task ended abnormally");
            }
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

fn draw(line: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    write!(stderr, "\r\x1b[2K{line}")?;
    stderr.flush()
}
