//! Alert dispatcher trait and per-recipient delivery report.

use super::DispatchError;

/// Trait for delivering an alert message to a set of recipients.
///
/// # Contract
///
/// Delivery is attempted for every recipient independently: a failure for
/// one recipient never prevents the attempt for the next one, and no
/// failure is propagated to the caller. Implementations do not retry.
pub trait AlertDispatcher: Send + Sync {
    /// Sends `message` to each of `recipients`.
    fn dispatch(
        &self,
        message: &str,
        recipients: &[String],
    ) -> impl std::future::Future<Output = DispatchReport> + Send;
}

/// Delivery result for one recipient.
#[derive(Debug)]
pub struct RecipientOutcome {
    /// Recipient handle (e.g. a Telegram chat id)
    pub recipient: String,
    /// Delivery result
    pub result: Result<(), DispatchError>,
}

/// Per-recipient results of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    outcomes: Vec<RecipientOutcome>,
}

impl DispatchReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    /// Records the result for one recipient.
    pub fn record(&mut self, recipient: impl Into<String>, result: Result<(), DispatchError>) {
        self.outcomes.push(RecipientOutcome {
            recipient: recipient.into(),
            result,
        });
    }

    /// Returns all recorded outcomes in dispatch order.
    #[must_use]
    pub fn outcomes(&self) -> &[RecipientOutcome] {
        &self.outcomes
    }

    /// Number of recipients the message was delivered to.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of recipients delivery failed for.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::HttpError;

    #[test]
    fn empty_report_has_no_counts() {
        let report = DispatchReport::new();
        assert_eq!(report.delivered(), 0);
        assert_eq!(report.failed(), 0);
        assert!(report.outcomes().is_empty());
    }

    #[test]
    fn counts_delivered_and_failed() {
        let mut report = DispatchReport::new();
        report.record("1", Ok(()));
        report.record("2", Err(DispatchError::Http(HttpError::Timeout)));
        report.record("3", Ok(()));

        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes()[1].recipient, "2");
    }
}
