// Copyright 2021-Present Datadog, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

use crate::arn::ArnParseError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for Lambda proxy operations.
pub type InvokerResult<T> = Result<T, InvokerError>;

/// Errors that can occur while building the invoker or during an invocation.
///
/// Every failed call yields exactly one of these. None of them is retried.
#[derive(Debug, Error)]
pub enum InvokerError {
    /// The Lambda client is not usable, e.g. it has no region.
    #[error("invalid Lambda client: {0}")]
    InvalidClient(String),

    /// The function handle is not a well-formed ARN.
    #[error("invalid function ARN `{function_arn}`: {source}")]
    InvalidFunctionHandle {
        function_arn: String,
        source: ArnParseError,
    },

    /// The invocation request did not complete (network, SDK or service error).
    #[error("failed to dispatch Lambda invocation: {0}")]
    Dispatch(#[source] BoxError),

    /// The function ran and raised an unhandled error.
    #[error("Lambda function error `{function_error}`: {payload}")]
    FunctionExecution {
        function_error: String,
        payload: String,
    },

    /// The invocation status does not match the invocation mode.
    #[error("unexpected invocation status code {status_code} (expected {expected})")]
    UnexpectedStatus { status_code: i32, expected: i32 },

    /// The function's own response carries a status code other than 200.
    #[error("unexpected response status code {status_code}")]
    UnexpectedInnerStatus { status_code: i64, body: String },

    #[error("empty payload returned by synchronous invocation")]
    EmptyPayload,

    #[error("payload returned by asynchronous invocation: `{payload}`")]
    UnexpectedPayload { payload: String },

    /// A request or response document could not be (de)serialized.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InvokerErrorKind {
    InvalidClient,
    InvalidFunctionHandle,
    Dispatch,
    FunctionExecution,
    UnexpectedStatus,
    UnexpectedInnerStatus,
    EmptyPayload,
    UnexpectedPayload,
    MalformedEnvelope,
}

impl InvokerErrorKind {
    pub fn label_value(&self) -> &'static str {
        match self {
            InvokerErrorKind::InvalidClient => "invalid_client",
            InvokerErrorKind::InvalidFunctionHandle => "invalid_function_handle",
            InvokerErrorKind::Dispatch => "dispatch",
            InvokerErrorKind::FunctionExecution => "function_execution",
            InvokerErrorKind::UnexpectedStatus => "unexpected_status",
            InvokerErrorKind::UnexpectedInnerStatus => "unexpected_inner_status",
            InvokerErrorKind::EmptyPayload => "empty_payload",
            InvokerErrorKind::UnexpectedPayload => "unexpected_payload",
            InvokerErrorKind::MalformedEnvelope => "malformed_envelope",
        }
    }
}

impl InvokerError {
    pub fn kind(&self) -> InvokerErrorKind {
        match self {
            InvokerError::InvalidClient(_) => InvokerErrorKind::InvalidClient,
            InvokerError::InvalidFunctionHandle { .. } => InvokerErrorKind::InvalidFunctionHandle,
            InvokerError::Dispatch(_) => InvokerErrorKind::Dispatch,
            InvokerError::FunctionExecution { .. } => InvokerErrorKind::FunctionExecution,
            InvokerError::UnexpectedStatus { .. } => InvokerErrorKind::UnexpectedStatus,
            InvokerError::UnexpectedInnerStatus { .. } => InvokerErrorKind::UnexpectedInnerStatus,
            InvokerError::EmptyPayload => InvokerErrorKind::EmptyPayload,
            InvokerError::UnexpectedPayload { .. } => InvokerErrorKind::UnexpectedPayload,
            InvokerError::MalformedEnvelope(_) => InvokerErrorKind::MalformedEnvelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_invoker_error_display() {
        let error = InvokerError::UnexpectedStatus {
            status_code: 500,
            expected: 202,
        };
        assert_eq!(
            error.to_string(),
            "unexpected invocation status code 500 (expected 202)"
        );
        assert_eq!(error.kind().label_value(), "unexpected_status");

        let error = InvokerError::InvalidFunctionHandle {
            function_arn: "my-function".to_string(),
            source: ArnParseError::InvalidPrefix,
        };
        assert_eq!(
            error.to_string(),
            "invalid function ARN `my-function`: ARN must start with `arn:`"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_dispatch_error_keeps_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let error = InvokerError::Dispatch(Box::new(io_error));
        assert_eq!(error.kind(), InvokerErrorKind::Dispatch);
        assert_eq!(error.source().unwrap().to_string(), "reset by peer");
    }
}
