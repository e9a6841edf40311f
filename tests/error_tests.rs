//! Tests for the error system.

use rapport::error::unified::*;
use rapport::error::*;
use rapport::storage::StorageError;

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: RapportError,
        expected_category: ErrorCategory,
        expected_retryable: bool,
        expected_recovery: RecoverySuggestion,
    }

    let network_error = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err();

    let cases = vec![
        Case {
            error: RapportError::validation("add_context", "content must be a non-empty string"),
            expected_category: ErrorCategory::Validation,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::FixInput,
        },
        Case {
            error: RapportError::Authentication {
                operation: Operation::Verify,
                message: "invalid API key".into(),
            },
            expected_category: ErrorCategory::Authentication,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: RapportError::QuotaExceeded {
                operation: Operation::Sort,
            },
            expected_category: ErrorCategory::Quota,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::UpgradePlan,
        },
        Case {
            error: RapportError::RateLimited {
                operation: Operation::Message,
            },
            expected_category: ErrorCategory::RateLimit,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: RapportError::Upstream {
                operation: Operation::Rewrite,
            },
            expected_category: ErrorCategory::Server,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: RapportError::network(Operation::MessageStream, network_error),
            expected_category: ErrorCategory::Network,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: RapportError::protocol(Operation::Engage, "missing field"),
            expected_category: ErrorCategory::Protocol,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::UpdateClient,
        },
        Case {
            error: RapportError::Storage(StorageError::Unavailable("read-only".into())),
            expected_category: ErrorCategory::Environment,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: RapportError::Api {
                operation: Operation::Message,
                status: 418,
                message: "teapot".into(),
            },
            expected_category: ErrorCategory::Api,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category, "{}", case.error);
        assert_eq!(case.error.is_retryable(), case.expected_retryable, "{}", case.error);
        assert_eq!(
            case.error.recovery_suggestion(),
            case.expected_recovery,
            "{}",
            case.error
        );
    }
}

#[test]
fn remote_errors_name_their_operation() {
    let err = RapportError::Server {
        operation: Operation::FetchUsage,
        status: 500,
    };
    assert_eq!(err.operation(), Some(Operation::FetchUsage));
    assert_eq!(
        err.to_string(),
        "fetch_usage: temporary server issue (status 500)"
    );
}

#[test]
fn local_errors_name_their_method() {
    let err = RapportError::IndexOutOfBounds {
        method: "remove_context",
        index: 4,
        len: 2,
    };
    assert_eq!(err.operation(), None);
    assert_eq!(
        err.to_string(),
        "remove_context: index 4 is out of bounds (length 2)"
    );
}

#[test]
fn operation_names_round_trip_through_strings() {
    assert_eq!(Operation::MessageStream.to_string(), "message_stream");
    assert_eq!("sort".parse::<Operation>().unwrap(), Operation::Sort);
}
