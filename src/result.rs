//! Uniform outcome of boundary operations
//!
//! Serialises to the flat record callers exchange:
//! `{"success": bool, "data": str|null, "filename": str|null, "error": str|null}`.

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// Outcome of `seal` / `open`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "OperationRecord", try_from = "OperationRecord")]
pub enum OperationResult {
    Success {
        /// Standard base64 text of the token (seal) or plaintext (open)
        payload: String,
        /// Suggested output filename
        filename: String,
    },
    Failure {
        error: String,
    },
}

impl OperationResult {
    pub fn success(payload: String, filename: String) -> Self {
        Self::Success { payload, filename }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Success { filename, .. } => Some(filename),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}

impl From<Result<(String, String), EnvelopeError>> for OperationResult {
    fn from(result: Result<(String, String), EnvelopeError>) -> Self {
        match result {
            Ok((payload, filename)) => Self::success(payload, filename),
            Err(e) => Self::failure(e),
        }
    }
}

/// Flat wire shape of [`OperationResult`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub success: bool,
    pub data: Option<String>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

impl From<OperationResult> for OperationRecord {
    fn from(result: OperationResult) -> Self {
        match result {
            OperationResult::Success { payload, filename } => Self {
                success: true,
                data: Some(payload),
                filename: Some(filename),
                error: None,
            },
            OperationResult::Failure { error } => Self {
                success: false,
                data: None,
                filename: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<OperationRecord> for OperationResult {
    type Error = String;

    fn try_from(record: OperationRecord) -> Result<Self, Self::Error> {
        match record {
            OperationRecord {
                success: true,
                data: Some(payload),
                filename: Some(filename),
                error: None,
            } => Ok(Self::Success { payload, filename }),
            OperationRecord {
                success: false,
                data: None,
                filename: None,
                error: Some(error),
            } => Ok(Self::Failure { error }),
            _ => Err("inconsistent operation record".to_string()),
        }
    }
}
