//! Typed errors for every phase of the registration and verification flows.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The phase of a flow in which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Derive,
    Upload,
    Submit,
    Reconcile,
    Lookup,
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Derive => "derive",
            Phase::Upload => "upload",
            Phase::Submit => "submit",
            Phase::Reconcile => "reconcile",
            Phase::Lookup => "lookup",
            Phase::Read => "read",
        };
        f.write_str(s)
    }
}

/// Why a single storage endpoint attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    Transport { message: String },
    Timeout,
    Status { code: u16, body: String },
    UnrecognizedResponse { body: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Transport { message } => write!(f, "transport error: {}", message),
            FailureReason::Timeout => f.write_str("attempt timed out"),
            FailureReason::Status { code, body } => write!(f, "HTTP {}: {}", code, body),
            FailureReason::UnrecognizedResponse { body } => {
                write!(f, "response carried no blob identifier: {}", body)
            }
        }
    }
}

/// One failed upload attempt, kept verbatim for diagnosability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub reason: FailureReason,
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.endpoint, self.reason)
    }
}

/// Errors returned by the ledger collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected ledger response shape: {0}")]
    Malformed(String),
}

/// Errors raised while decoding keys or signing transactions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("failed to read keystore {path}: {reason}")]
    Keystore { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid input: {message}")]
    InvalidInput { phase: Phase, message: String },

    #[error("all {} storage endpoints failed: {}", .failures.len(), join_failures(.failures))]
    AllEndpointsFailed {
        phase: Phase,
        failures: Vec<EndpointFailure>,
    },

    #[error("transaction rejected{}: {reason}", digest_suffix(.digest))]
    TransactionRejected {
        digest: Option<String>,
        reason: String,
    },

    #[error("settlement not observed within {waited_ms} ms{}; re-check the claim index before resubmitting", digest_suffix(.digest))]
    SettlementTimeout {
        digest: Option<String>,
        waited_ms: u64,
    },

    #[error("transaction {digest} succeeded but no {expected_type} was created: {detail}")]
    ClaimNotFoundInResult {
        digest: String,
        expected_type: String,
        detail: String,
    },

    #[error("object {object_id} is not a valid claim: {reason}")]
    MalformedClaim { object_id: String, reason: String },

    #[error("ledger unavailable during {phase}: {source}")]
    Ledger {
        phase: Phase,
        #[source]
        source: LedgerError,
    },

    #[error("signing failed: {0}")]
    Signer(#[from] SignerError),

    #[error("cancelled during {phase}")]
    Cancelled { phase: Phase },
}

impl RegistryError {
    /// The flow phase this error belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            RegistryError::InvalidInput { phase, .. }
            | RegistryError::AllEndpointsFailed { phase, .. } => *phase,
            RegistryError::TransactionRejected { .. } | RegistryError::Signer(_) => Phase::Submit,
            RegistryError::SettlementTimeout { .. }
            | RegistryError::ClaimNotFoundInResult { .. } => Phase::Reconcile,
            RegistryError::MalformedClaim { .. } => Phase::Lookup,
            RegistryError::Ledger { phase, .. } | RegistryError::Cancelled { phase } => *phase,
        }
    }

    /// Message suitable for end users: the failed phase followed by the cause.
    pub fn user_message(&self) -> String {
        format!("{} failed: {}", self.phase(), self)
    }

    pub(crate) fn invalid(phase: Phase, message: impl Into<String>) -> Self {
        RegistryError::InvalidInput {
            phase,
            message: message.into(),
        }
    }

    pub(crate) fn ledger(phase: Phase, source: LedgerError) -> Self {
        RegistryError::Ledger { phase, source }
    }
}

fn join_failures(failures: &[EndpointFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn digest_suffix(digest: &Option<String>) -> String {
    digest
        .as_ref()
        .map(|d| format!(" (tx: {})", d))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_prefixes_user_message() {
        let err = RegistryError::AllEndpointsFailed {
            phase: Phase::Upload,
            failures: vec![EndpointFailure {
                endpoint: "http://a".to_string(),
                reason: FailureReason::Timeout,
            }],
        };
        assert_eq!(err.phase(), Phase::Upload);
        assert!(err.user_message().starts_with("upload failed: all 1 storage endpoints failed"));
    }

    #[test]
    fn ledger_errors_keep_their_phase() {
        let err = RegistryError::ledger(Phase::Lookup, LedgerError::Transport("refused".into()));
        assert_eq!(err.phase(), Phase::Lookup);

        let timeout = RegistryError::SettlementTimeout {
            digest: Some("D1".into()),
            waited_ms: 10,
        };
        assert_eq!(timeout.phase(), Phase::Reconcile);
        assert!(timeout.to_string().contains("(tx: D1)"));
    }

    #[test]
    fn invalid_input_names_the_phase_it_came_from() {
        let err = RegistryError::invalid(Phase::Submit, "requester 0xaaa does not match signer 0xbbb");
        assert_eq!(err.phase(), Phase::Submit);
        assert!(err.user_message().starts_with("submit failed: invalid input: requester"));

        let read = RegistryError::AllEndpointsFailed {
            phase: Phase::Read,
            failures: Vec::new(),
        };
        assert!(read.user_message().starts_with("read failed:"));
    }
}
