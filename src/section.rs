//! Load state for one dashboard section and the background job feeding it.

use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};

use crate::github::FetchError;

pub type FetchOutcome<T> = Result<T, FetchError>;

/// Identifies one fetch attempt. Only the most recently issued ticket may
/// update the section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

pub struct Section<T> {
    data: Option<T>,
    error: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
    latest: u64,
    in_flight: Option<Ticket>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
            latest: 0,
            in_flight: None,
        }
    }
}

impl<T> Section<T> {
    /// Starts a new attempt, superseding any attempt still in flight.
    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        let ticket = Ticket(self.latest);
        self.in_flight = Some(ticket);
        self.error = None;
        ticket
    }

    /// Applies a finished attempt. Returns `false` and leaves the section
    /// untouched if `ticket` has been superseded. Errors keep the last good
    /// data.
    pub fn complete(&mut self, ticket: Ticket, outcome: FetchOutcome<T>) -> bool {
        if self.in_flight != Some(ticket) {
            tracing::debug!(?ticket, latest = self.latest, "discarding stale response");
            return false;
        }
        self.in_flight = None;
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.fetched_at = Some(Utc::now());
            }
            Err(err) => {
                tracing::warn!(error = %err, "section fetch failed");
                self.error = Some(err.to_string());
            }
        }
        true
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// Fetch running on a worker thread, tagged with the ticket it answers.
pub struct PendingJob<T> {
    ticket: Ticket,
    receiver: Receiver<FetchOutcome<T>>,
}

impl<T: Send + 'static> PendingJob<T> {
    pub fn spawn<F>(ticket: Ticket, work: F) -> Self
    where
        F: FnOnce() -> FetchOutcome<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(work());
        });
        Self {
            ticket,
            receiver: rx,
        }
    }

    pub fn try_take(&self) -> Option<(Ticket, FetchOutcome<T>)> {
        match self.receiver.try_recv() {
            Ok(result) => Some((self.ticket, result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some((self.ticket, Err(FetchError::BackgroundWorkerGone)))
            }
        }
    }
}

/// Section plus the jobs started for it. Jobs that finish after being
/// superseded are dropped by the ticket check.
pub struct LoadedSection<T> {
    pub state: Section<T>,
    jobs: Vec<PendingJob<T>>,
}

impl<T> Default for LoadedSection<T> {
    fn default() -> Self {
        Self {
            state: Section::default(),
            jobs: Vec::new(),
        }
    }
}

impl<T: Send + 'static> LoadedSection<T> {
    pub fn start<F>(&mut self, work: F)
    where
        F: FnOnce() -> FetchOutcome<T> + Send + 'static,
    {
        let ticket = self.state.begin();
        self.jobs.push(PendingJob::spawn(ticket, work));
    }

    pub fn poll(&mut self) {
        let mut finished = Vec::new();
        self.jobs.retain(|job| match job.try_take() {
            None => true,
            Some(result) => {
                finished.push(result);
                false
            }
        });
        for (ticket, outcome) in finished {
            self.state.complete(ticket, outcome);
        }
    }
}

/// Fires at a fixed interval until cancelled. Polled from the UI loop.
pub struct RefreshScheduler {
    interval: Duration,
    last_run: Option<Instant>,
    cancelled: bool,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            cancelled: false,
        }
    }

    pub fn should_trigger(&self) -> bool {
        self.should_trigger_at(Instant::now())
    }

    fn should_trigger_at(&self, now: Instant) -> bool {
        if self.cancelled {
            return false;
        }
        match self.last_run {
            None => true,
            Some(instant) => now.duration_since(instant) >= self.interval,
        }
    }

    pub fn mark_triggered(&mut self) {
        self.last_run = Some(Instant::now());
    }

    /// Re-arms a cancelled scheduler; the next poll waits a full interval.
    pub fn resume(&mut self) {
        self.cancelled = false;
        self.mark_triggered();
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
