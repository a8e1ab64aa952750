//! Map transport failures onto ledger outcomes.

use crate::ledger::OutcomeStatus;

use super::error::FetchError;

/// 404 and 410 mean the resource is gone; every other non-2xx is a general error.
pub fn classify_http_status(code: u32) -> OutcomeStatus {
    match code {
        404 | 410 => OutcomeStatus::FileNotExist,
        _ => OutcomeStatus::GeneralError,
    }
}

pub fn classify(e: &FetchError) -> OutcomeStatus {
    match e {
        FetchError::Cancelled => OutcomeStatus::TimeOut,
        FetchError::Curl(ce) if ce.is_operation_timedout() => OutcomeStatus::TimeOut,
        FetchError::Curl(ce) if ce.is_url_malformed() || ce.is_unsupported_protocol() => {
            OutcomeStatus::InvalidUrl
        }
        FetchError::Curl(_) | FetchError::Storage(_) => OutcomeStatus::GeneralError,
        FetchError::Http(code) => classify_http_status(*code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_gone_is_file_not_exist() {
        assert_eq!(classify_http_status(404), OutcomeStatus::FileNotExist);
        assert_eq!(classify_http_status(410), OutcomeStatus::FileNotExist);
    }

    #[test]
    fn other_http_errors_are_general() {
        assert_eq!(classify_http_status(403), OutcomeStatus::GeneralError);
        assert_eq!(classify_http_status(500), OutcomeStatus::GeneralError);
        assert_eq!(classify(&FetchError::Http(503)), OutcomeStatus::GeneralError);
    }

    #[test]
    fn cancellation_is_a_timeout() {
        assert_eq!(classify(&FetchError::Cancelled), OutcomeStatus::TimeOut);
    }

    #[test]
    fn curl_codes_map_to_outcomes() {
        // CURLE_UNSUPPORTED_PROTOCOL, CURLE_URL_MALFORMAT, CURLE_COULDNT_CONNECT, CURLE_OPERATION_TIMEDOUT
        let curl = |code: u32| FetchError::Curl(::curl::Error::new(code));
        assert_eq!(classify(&curl(1)), OutcomeStatus::InvalidUrl);
        assert_eq!(classify(&curl(3)), OutcomeStatus::InvalidUrl);
        assert_eq!(classify(&curl(7)), OutcomeStatus::GeneralError);
        assert_eq!(classify(&curl(28)), OutcomeStatus::TimeOut);
    }

    #[test]
    fn storage_failure_is_general() {
        let e = FetchError::Storage(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(classify(&e), OutcomeStatus::GeneralError);
    }
}
