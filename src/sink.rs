use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tonic::Status;
use tracing::{debug, info, warn};

use crate::signal::CompletionSignal;

/// Handler for the inbound side of a streaming exchange.
///
/// The transport calls it from its own delivery task, one event at a time and
/// in arrival order: zero or more `on_element`, then exactly one of
/// `on_error` or `on_completed`. Implementations must return quickly; they
/// run on the path that delivers the next message.
pub trait ResponseSink<T>: Send + 'static {
    fn on_element(&mut self, item: T);

    /// Terminal. The failure is recorded or reported, never re-raised.
    fn on_error(&mut self, status: Status);

    /// Terminal.
    fn on_completed(&mut self);
}

impl<T, S> ResponseSink<T> for Box<S>
where
    S: ResponseSink<T> + ?Sized,
{
    fn on_element(&mut self, item: T) {
        (**self).on_element(item)
    }

    fn on_error(&mut self, status: Status) {
        (**self).on_error(status)
    }

    fn on_completed(&mut self) {
        (**self).on_completed()
    }
}

/// How an exchange ended, as seen by the caller.
#[derive(Debug)]
pub enum ExchangeOutcome<T> {
    /// The server closed its side cleanly.
    Completed(T),
    /// The server (or the transport) ended the call with an error status.
    Failed(Status),
    /// The completion signal did not fire within the caller's bound.
    TimedOut,
}

impl<T> ExchangeOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExchangeOutcome::Completed(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ExchangeOutcome<U> {
        match self {
            ExchangeOutcome::Completed(value) => ExchangeOutcome::Completed(f(value)),
            ExchangeOutcome::Failed(status) => ExchangeOutcome::Failed(status),
            ExchangeOutcome::TimedOut => ExchangeOutcome::TimedOut,
        }
    }
}

#[derive(Debug)]
struct ExchangeRecord<T> {
    elements: Vec<T>,
    failure: Option<Status>,
    terminated: bool,
}

type SharedRecord<T> = Arc<Mutex<ExchangeRecord<T>>>;

fn lock<T>(record: &SharedRecord<T>) -> MutexGuard<'_, ExchangeRecord<T>> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sink that logs every event, keeps the inbound elements and fires the
/// exchange's [`CompletionSignal`] on the terminal event.
pub struct RecordingSink<T> {
    call: &'static str,
    prefix: &'static str,
    signal: CompletionSignal,
    record: SharedRecord<T>,
}

impl<T> RecordingSink<T> {
    /// Logs every inbound element behind `prefix`, e.g. `"Got message "`.
    pub fn prefixed(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    fn describe(&self, item: &T) -> String
    where
        T: Display,
    {
        format!("{}{}", self.prefix, item)
    }

    fn terminate(&mut self, failure: Option<Status>) {
        {
            let mut record = lock(&self.record);
            if record.terminated {
                debug!(call = self.call, "Ignoring event after terminal event");
                return;
            }
            record.terminated = true;
            record.failure = failure;
        }
        self.signal.signal();
    }
}

impl<T> ResponseSink<T> for RecordingSink<T>
where
    T: Display + Send + 'static,
{
    fn on_element(&mut self, item: T) {
        let mut record = lock(&self.record);
        if record.terminated {
            debug!(call = self.call, "Ignoring element after terminal event");
            return;
        }
        info!(call = self.call, "{}", self.describe(&item));
        record.elements.push(item);
    }

    fn on_error(&mut self, status: Status) {
        warn!(
            call = self.call,
            code = ?status.code(),
            "Call failed: {}",
            status.message()
        );
        self.terminate(Some(status));
    }

    fn on_completed(&mut self) {
        info!(call = self.call, "Finished");
        self.terminate(None);
    }
}

/// Caller-side view of one streaming exchange: the completion signal plus
/// whatever the paired [`RecordingSink`] recorded.
pub struct Exchange<T> {
    call: &'static str,
    signal: CompletionSignal,
    record: SharedRecord<T>,
}

impl<T> Exchange<T> {
    /// Creates an exchange for the call named `call` and the sink that feeds
    /// it.
    pub fn new(call: &'static str) -> (Self, RecordingSink<T>) {
        let signal = CompletionSignal::new();
        let record = Arc::new(Mutex::new(ExchangeRecord {
            elements: Vec::new(),
            failure: None,
            terminated: false,
        }));

        let sink = RecordingSink {
            call,
            prefix: "",
            signal: signal.clone(),
            record: record.clone(),
        };
        (
            Exchange {
                call,
                signal,
                record,
            },
            sink,
        )
    }

    pub fn call(&self) -> &'static str {
        self.call
    }

    pub fn signal(&self) -> &CompletionSignal {
        &self.signal
    }

    pub fn is_finished(&self) -> bool {
        self.signal.is_signaled()
    }

    pub async fn await_until(&self, timeout: Duration) -> bool {
        self.signal.await_until(timeout).await
    }

    /// Inbound elements recorded so far.
    pub fn element_count(&self) -> usize {
        lock(&self.record).elements.len()
    }

    /// `TimedOut` while the signal has not fired, otherwise the recorded
    /// terminal state together with the inbound elements.
    pub fn into_outcome(self) -> ExchangeOutcome<Vec<T>> {
        if !self.signal.is_signaled() {
            return ExchangeOutcome::TimedOut;
        }

        let mut record = lock(&self.record);
        match record.failure.take() {
            Some(status) => ExchangeOutcome::Failed(status),
            None => ExchangeOutcome::Completed(std::mem::take(&mut record.elements)),
        }
    }
}
