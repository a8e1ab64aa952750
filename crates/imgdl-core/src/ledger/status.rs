use std::fmt;

/// Terminal outcome of one attempt on one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeStatus {
    Success,
    FileNotExist,
    InvalidUrl,
    TimeOut,
    ValidationFailed,
    GeneralError,
}

impl OutcomeStatus {
    pub const ALL: [OutcomeStatus; 6] = [
        OutcomeStatus::Success,
        OutcomeStatus::FileNotExist,
        OutcomeStatus::InvalidUrl,
        OutcomeStatus::TimeOut,
        OutcomeStatus::ValidationFailed,
        OutcomeStatus::GeneralError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "Success",
            OutcomeStatus::FileNotExist => "FileNotExist",
            OutcomeStatus::InvalidUrl => "InvalidUrl",
            OutcomeStatus::TimeOut => "TimeOut",
            OutcomeStatus::ValidationFailed => "ValidationFailed",
            OutcomeStatus::GeneralError => "GeneralError",
        }
    }

    /// Parses the ledger spelling. Unknown text is `None` (a corrupt row).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn is_success(self) -> bool {
        self == OutcomeStatus::Success
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
