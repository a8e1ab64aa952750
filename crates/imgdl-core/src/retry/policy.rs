use crate::ledger::OutcomeStatus;

/// Whether an ID is fetched in the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDecision {
    Enqueue,
    Skip,
}

/// Maps the latest recorded outcome of an ID to a pass decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    /// Re-attempt `FileNotExist` and `GeneralError`.
    pub retry_failed: bool,
}

impl RetryPolicy {
    pub fn new(retry_failed: bool) -> Self {
        Self { retry_failed }
    }

    /// `prior` is the latest status in the ledger, `None` when never attempted.
    pub fn decide(&self, prior: Option<OutcomeStatus>) -> PassDecision {
        match prior {
            None => PassDecision::Enqueue,
            Some(OutcomeStatus::Success) | Some(OutcomeStatus::InvalidUrl) => PassDecision::Skip,
            Some(OutcomeStatus::TimeOut) | Some(OutcomeStatus::ValidationFailed) => {
                PassDecision::Enqueue
            }
            Some(OutcomeStatus::FileNotExist) | Some(OutcomeStatus::GeneralError) => {
                if self.retry_failed {
                    PassDecision::Enqueue
                } else {
                    PassDecision::Skip
                }
            }
        }
    }

    pub fn should_fetch(&self, prior: Option<OutcomeStatus>) -> bool {
        self.decide(prior) == PassDecision::Enqueue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_table_without_retry_failed() {
        let p = RetryPolicy::new(false);
        let table = [
            (None, PassDecision::Enqueue),
            (Some(OutcomeStatus::Success), PassDecision::Skip),
            (Some(OutcomeStatus::TimeOut), PassDecision::Enqueue),
            (Some(OutcomeStatus::ValidationFailed), PassDecision::Enqueue),
            (Some(OutcomeStatus::FileNotExist), PassDecision::Skip),
            (Some(OutcomeStatus::GeneralError), PassDecision::Skip),
            (Some(OutcomeStatus::InvalidUrl), PassDecision::Skip),
        ];
        for (prior, expected) in table {
            assert_eq!(p.decide(prior), expected, "prior {:?}", prior);
        }
    }

    #[test]
    fn retry_failed_only_widens_hard_failures() {
        let strict = RetryPolicy::new(false);
        let lenient = RetryPolicy::new(true);
        for status in OutcomeStatus::ALL {
            let widened = matches!(
                status,
                OutcomeStatus::FileNotExist | OutcomeStatus::GeneralError
            );
            assert_eq!(
                lenient.should_fetch(Some(status)),
                strict.should_fetch(Some(status)) || widened,
                "status {}",
                status
            );
        }
        assert!(lenient.should_fetch(Some(OutcomeStatus::GeneralError)));
        assert!(!lenient.should_fetch(Some(OutcomeStatus::InvalidUrl)));
        assert!(!lenient.should_fetch(Some(OutcomeStatus::Success)));
    }
}
