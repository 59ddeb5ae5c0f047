//! Ticket poller
//!
//! Drives a [`StatusResolver`] until SUNAT resolves the ticket. Every
//! suspension point (the in-flight query and the inter-poll delay) is raced
//! against the overall deadline and the caller's [`CancellationToken`], so the
//! loop never outlives `deadline + interval` and stops promptly on Ctrl-C.
//!
//! ```text
//! Processing ──98──▶ Processing
//!     │
//!     ├── 0 ──────▶ Success
//!     ├── 99 ─────▶ Error
//!     ├── other ──▶ Unrecognized
//!     ├── budget ─▶ Exhausted
//!     ├── deadline ▶ Timeout
//!     └── cancel ─▶ Unreachable
//! ```

use std::sync::Arc;
use std::time::Duration;

use sunat_domain::{AccessToken, PollConfig, ResponseCode, Result, StatusResult, SunatError, Ticket};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::ports::StatusResolver;

/// Stand-in deadline for timeouts too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Terminal state of a poll run.
///
/// The loop itself sits in an implicit `Processing` state; it only returns
/// once it has left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// `codRespuesta` 0
    Success,
    /// `codRespuesta` 99
    Error,
    /// A terminal code outside the documented set
    Unrecognized,
    /// The deadline elapsed while the ticket was still processing
    Timeout,
    /// The attempt budget ran out while the ticket was still processing
    Exhausted,
    /// The caller cancelled the run
    Unreachable,
}

impl PollState {
    /// Whether SUNAT produced a terminal answer.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Unrecognized)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Unrecognized => "unrecognized",
            Self::Timeout => "timeout",
            Self::Exhausted => "exhausted",
            Self::Unreachable => "unreachable",
        }
    }
}

/// Everything observed during one poll run.
#[derive(Debug, Clone)]
pub struct PollReport {
    pub state: PollState,
    /// Most recent status received. For resolved states this is the terminal
    /// status itself.
    pub last_status: Option<StatusResult>,
    /// Most recent per-attempt failure, if any
    pub last_fault: Option<SunatError>,
    /// Number of status queries started
    pub attempts: u32,
    pub elapsed: Duration,
}

impl PollReport {
    /// Collapse the report into the terminal status or a local failure.
    ///
    /// # Errors
    /// `Timeout` and `Exhausted` map to `SunatError::Timeout`; `Unreachable`
    /// maps to `SunatError::Unreachable`.
    pub fn into_result(self) -> Result<StatusResult> {
        match self.state {
            PollState::Success | PollState::Error | PollState::Unrecognized => {
                self.last_status.ok_or_else(|| SunatError::MalformedResponse {
                    context: "polling ticket status".to_string(),
                    body: "resolved without a status".to_string(),
                })
            }
            PollState::Timeout | PollState::Exhausted => Err(SunatError::Timeout {
                elapsed: self.elapsed,
                attempts: self.attempts,
                last_code: self.last_status.map(|status| status.response_code.to_string()),
            }),
            PollState::Unreachable => Err(SunatError::Unreachable),
        }
    }
}

/// Bounded status poll loop over a [`StatusResolver`].
#[derive(Clone)]
pub struct ReceiptPoller {
    resolver: Arc<dyn StatusResolver>,
    config: PollConfig,
}

impl ReceiptPoller {
    pub fn new(resolver: Arc<dyn StatusResolver>, config: PollConfig) -> Self {
        Self { resolver, config }
    }

    /// Poll until the ticket resolves, the budget or deadline runs out, or
    /// `cancel` fires.
    #[instrument(skip(self, token, cancel), fields(ticket = %ticket))]
    pub async fn poll(
        &self,
        token: &AccessToken,
        ticket: &Ticket,
        cancel: &CancellationToken,
    ) -> PollReport {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.config.timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let mut tracker = Tracker::default();

        loop {
            if cancel.is_cancelled() {
                return tracker.finish(PollState::Unreachable, started);
            }

            tracker.attempts = tracker.attempts.saturating_add(1);
            let attempt = tracker.attempts;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempt, "Status query abandoned on cancellation");
                    return tracker.finish(PollState::Unreachable, started);
                }
                _ = sleep_until(deadline) => {
                    debug!(attempt, "Status query abandoned at deadline");
                    return tracker.finish(PollState::Timeout, started);
                }
                result = self.resolver.status(token, ticket) => result,
            };

            match result {
                Ok(status) => {
                    debug!(attempt, code = %status.response_code, "Status received");
                    let state =
                        status.response_code.is_terminal().then(|| match status.response_code {
                            ResponseCode::Success => PollState::Success,
                            ResponseCode::Error => PollState::Error,
                            _ => PollState::Unrecognized,
                        });
                    tracker.last_status = Some(status);
                    if let Some(state) = state {
                        return tracker.finish(state, started);
                    }
                }
                Err(err) => {
                    warn!(attempt, error = %err, kind = err.label(), "Status query failed");
                    tracker.last_fault = Some(err);
                }
            }

            if self.config.max_attempts.is_some_and(|max| attempt >= max) {
                return tracker.finish(PollState::Exhausted, started);
            }

            if Instant::now() >= deadline {
                return tracker.finish(PollState::Timeout, started);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return tracker.finish(PollState::Unreachable, started);
                }
                _ = sleep_until(deadline) => {
                    return tracker.finish(PollState::Timeout, started);
                }
                _ = sleep(self.config.interval) => {}
            }
        }
    }
}

#[derive(Default)]
struct Tracker {
    last_status: Option<StatusResult>,
    last_fault: Option<SunatError>,
    attempts: u32,
}

impl Tracker {
    fn finish(self, state: PollState, started: Instant) -> PollReport {
        let report = PollReport {
            state,
            last_status: self.last_status,
            last_fault: self.last_fault,
            attempts: self.attempts,
            elapsed: started.elapsed(),
        };

        if state.is_resolved() {
            info!(
                state = state.label(),
                attempts = report.attempts,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Ticket resolved"
            );
        } else {
            warn!(
                state = state.label(),
                attempts = report.attempts,
                elapsed_ms = report.elapsed.as_millis() as u64,
                last_fault = report.last_fault.as_ref().map(|e| e.label()),
                "Ticket left unresolved"
            );
        }

        report
    }
}
