//! The poll loop: fetch, validate, extract, notify, sleep.
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::error::CycleError;
use crate::notifier::{self, Notifier};
use crate::practicum::{check_response, HomeworkApi};
use crate::status::parse_status;

/// What a successful cycle ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The answer carried no homework records.
    NoHomeworks,
    /// The verdict equals the last one sent; nothing dispatched.
    Unchanged,
    /// A new verdict was dispatched. `delivered` is false when the chat transport failed.
    Notified { delivered: bool },
}

pub struct Poller {
    api: Box<dyn HomeworkApi>,
    notifier: Box<dyn Notifier>,
    chat_id: String,
    retry_period: Duration,
    cursor: i64,
    last_message: String,
}

impl Poller {
    pub fn new(
        api: Box<dyn HomeworkApi>,
        notifier: Box<dyn Notifier>,
        chat_id: String,
        retry_period: Duration,
        start_cursor: i64,
    ) -> Self {
        Self {
            api,
            notifier,
            chat_id,
            retry_period,
            cursor: start_cursor,
            last_message: String::new(),
        }
    }

    /// Lower bound of the next query window.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Last verdict handed to the notifier, empty before the first one.
    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    /// Run one cycle without sleeping. The cursor moves forward as soon as
    /// the answer validates, even if the record itself is unusable.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, CycleError> {
        let response = self.api.get_api_answer(self.cursor).await?;
        let answer = check_response(&response)?;
        self.cursor = self.cursor.max(answer.current_date);

        let Some(homework) = answer.latest() else {
            debug!(cursor = self.cursor, "no homework updates");
            return Ok(CycleOutcome::NoHomeworks);
        };

        let message = parse_status(homework)?;
        if message == self.last_message {
            debug!(cursor = self.cursor, "status unchanged");
            return Ok(CycleOutcome::Unchanged);
        }

        self.last_message = message;
        let delivered =
            notifier::send_message(self.notifier.as_ref(), &self.chat_id, &self.last_message)
                .await;
        Ok(CycleOutcome::Notified { delivered })
    }

    /// Run one cycle and log its result. Errors and panics end here.
    #[instrument(skip_all, fields(cursor = self.cursor))]
    pub async fn run_cycle(&mut self) {
        let result = AssertUnwindSafe(self.poll_once()).catch_unwind().await;
        match result {
            Ok(Ok(outcome)) => debug!(?outcome, cursor = self.cursor, "cycle finished"),
            Ok(Err(err)) => error!(%err, kind = error_kind(&err), "cycle failed"),
            Err(panic) => error!(reason = panic_message(&*panic), "cycle panicked"),
        }
    }

    /// Poll forever, sleeping the retry period after every cycle.
    pub async fn run(mut self) {
        info!(
            cursor = self.cursor,
            retry_period_secs = self.retry_period.as_secs(),
            "starting homework status polling"
        );
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.retry_period).await;
        }
    }
}

fn error_kind(err: &CycleError) -> &'static str {
    use crate::error::FetchError;
    match err {
        CycleError::Fetch(FetchError::Request { .. }) => "request",
        CycleError::Fetch(FetchError::Answer { .. }) => "answer",
        CycleError::Fetch(FetchError::Decode(_)) => "decode",
        CycleError::Shape(_) => "shape",
        CycleError::Status(_) => "undocumented_status",
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
