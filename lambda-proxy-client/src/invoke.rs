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

//! The narrow remote-call capability the invoker depends on.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{InvocationType, LogType};

use crate::error::BoxError;

const STATUS_OK: i32 = 200;
const STATUS_ACCEPTED: i32 = 202;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InvocationMode {
    /// Request-response: the caller waits for the function's result.
    Sync,
    /// Event: the invocation is queued and only acknowledged.
    Async,
}

impl InvocationMode {
    pub fn invocation_type(&self) -> InvocationType {
        match self {
            InvocationMode::Sync => InvocationType::RequestResponse,
            InvocationMode::Async => InvocationType::Event,
        }
    }

    pub fn expected_status_code(&self) -> i32 {
        match self {
            InvocationMode::Sync => STATUS_OK,
            InvocationMode::Async => STATUS_ACCEPTED,
        }
    }

    pub fn label_value(&self) -> &'static str {
        match self {
            InvocationMode::Sync => "sync",
            InvocationMode::Async => "async",
        }
    }
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label_value())
    }
}

/// What the invoker needs to know about an `Invoke` response.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct InvokeOutcome {
    pub status_code: i32,
    /// Set when the function raised an unhandled error (e.g. `Unhandled`).
    pub function_error: Option<String>,
    /// Empty when the response carried no payload.
    pub payload: Vec<u8>,
}

/// Invokes a function by name with a given invocation type and payload.
///
/// Implemented for the AWS SDK client. Other implementations are used as test doubles.
#[async_trait]
pub trait LambdaInvoke: Send + Sync + 'static {
    /// Checks, without any network call, that the client is able to dispatch invocations.
    fn check_client(&self) -> Result<(), String> {
        Ok(())
    }

    async fn invoke_function(
        &self,
        function_name: &str,
        mode: InvocationMode,
        payload: Vec<u8>,
    ) -> Result<InvokeOutcome, BoxError>;
}

#[async_trait]
impl LambdaInvoke for LambdaClient {
    fn check_client(&self) -> Result<(), String> {
        if self.config().region().is_none() {
            return Err("Lambda client has no AWS region configured".to_string());
        }
        Ok(())
    }

    async fn invoke_function(
        &self,
        function_name: &str,
        mode: InvocationMode,
        payload: Vec<u8>,
    ) -> Result<InvokeOutcome, BoxError> {
        let response = self
            .invoke()
            .function_name(function_name)
            .invocation_type(mode.invocation_type())
            .log_type(LogType::None)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(BoxError::from)?;

        let function_error = response.function_error().map(ToString::to_string);
        let payload = response
            .payload()
            .map(|blob| blob.as_ref().to_vec())
            .unwrap_or_default();

        Ok(InvokeOutcome {
            status_code: response.status_code(),
            function_error,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_lambda::operation::invoke::{InvokeError, InvokeOutput};
    use aws_sdk_lambda::types::error::ResourceNotFoundException;
    use aws_smithy_mocks::{mock, mock_client};

    use super::*;

    const FUNCTION_NAME: &str = "arn:aws:lambda:eu-central-1:000000000000:function:my-function";

    #[test]
    fn test_invocation_mode() {
        assert_eq!(
            InvocationMode::Sync.invocation_type(),
            InvocationType::RequestResponse
        );
        assert_eq!(InvocationMode::Sync.expected_status_code(), 200);
        assert_eq!(InvocationMode::Async.invocation_type(), InvocationType::Event);
        assert_eq!(InvocationMode::Async.expected_status_code(), 202);
        assert_eq!(InvocationMode::Async.to_string(), "async");
    }

    #[tokio::test]
    async fn test_lambda_client_invoke_function_sends_request() {
        let rule = mock!(aws_sdk_lambda::Client::invoke)
            .match_requests(|request| {
                request.function_name() == Some(FUNCTION_NAME)
                    && request.invocation_type() == Some(&InvocationType::Event)
                    && request.log_type() == Some(&LogType::None)
                    && request.payload().map(|blob| blob.as_ref()) == Some(&b"{}"[..])
            })
            .then_output(|| InvokeOutput::builder().status_code(202).build());
        let client = mock_client!(aws_sdk_lambda, [&rule]);

        let outcome = client
            .invoke_function(FUNCTION_NAME, InvocationMode::Async, b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InvokeOutcome {
                status_code: 202,
                function_error: None,
                payload: Vec::new(),
            }
        );
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_lambda_client_invoke_function_maps_function_error() {
        let rule = mock!(aws_sdk_lambda::Client::invoke).then_output(|| {
            InvokeOutput::builder()
                .status_code(200)
                .function_error("Unhandled")
                .payload(Blob::new(r#"{"errorMessage":"boom"}"#))
                .build()
        });
        let client = mock_client!(aws_sdk_lambda, [&rule]);

        let outcome = client
            .invoke_function(FUNCTION_NAME, InvocationMode::Sync, b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.function_error.as_deref(), Some("Unhandled"));
        assert_eq!(outcome.payload, br#"{"errorMessage":"boom"}"#);
    }

    #[tokio::test]
    async fn test_lambda_client_invoke_function_service_error() {
        let rule = mock!(aws_sdk_lambda::Client::invoke).then_error(|| {
            InvokeError::ResourceNotFoundException(ResourceNotFoundException::builder().build())
        });
        let client = mock_client!(aws_sdk_lambda, [&rule]);

        client
            .invoke_function(FUNCTION_NAME, InvocationMode::Sync, b"{}".to_vec())
            .await
            .unwrap_err();
    }

    #[test]
    fn test_lambda_client_check_client() {
        let rule = mock!(aws_sdk_lambda::Client::invoke)
            .then_output(|| InvokeOutput::builder().status_code(200).build());
        let client = mock_client!(aws_sdk_lambda, [&rule]);
        client.check_client().unwrap();

        let config = aws_sdk_lambda::Config::builder()
            .behavior_version(aws_sdk_lambda::config::BehaviorVersion::latest())
            .build();
        let client_without_region = LambdaClient::from_conf(config);
        let error = client_without_region.check_client().unwrap_err();
        assert!(error.contains("region"));
    }
}
