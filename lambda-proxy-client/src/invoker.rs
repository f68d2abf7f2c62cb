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

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_lambda::Client as LambdaClient;
use tracing::{debug, instrument};

use crate::arn::FunctionArn;
use crate::envelope::{ProxyRequest, ProxyResponse};
use crate::error::{InvokerError, InvokerResult};
use crate::invoke::{InvocationMode, LambdaInvoke};
use crate::metrics::LAMBDA_PROXY_METRICS;

const INNER_STATUS_OK: i64 = 200;

/// A remote function seen as an HTTP endpoint.
#[cfg_attr(any(test, feature = "testsuite"), mockall::automock)]
#[async_trait]
pub trait FunctionInvoker: Send + Sync + 'static {
    /// Invokes the function synchronously and returns the body of its response.
    ///
    /// Any response status code other than 200 is reported as
    /// [`InvokerError::UnexpectedInnerStatus`].
    async fn invoke(&self, http_method: &str, path: &str, body: &[u8]) -> InvokerResult<String>;

    /// Queues an invocation of the function.
    ///
    /// Success only means the invocation was accepted: the outcome of the function's execution is
    /// not reported back.
    async fn invoke_async(&self, http_method: &str, path: &str, body: &[u8]) -> InvokerResult<()>;
}

/// Wraps requests into API-Gateway-proxy documents, invokes the Lambda function and unwraps its
/// responses.
///
/// The invoker is stateless. It can be shared between tasks, each call being independent. It
/// never retries, and a call is cancelled by dropping its future, e.g. with
/// `tokio::time::timeout`.
#[derive(Clone)]
pub struct LambdaProxyInvoker<C = LambdaClient> {
    client: C,
    function_arn: FunctionArn,
}

impl<C> fmt::Debug for LambdaProxyInvoker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaProxyInvoker")
            .field("function_arn", &self.function_arn)
            .finish()
    }
}

impl<C: LambdaInvoke> LambdaProxyInvoker<C> {
    /// Binds `client` to the function identified by `function_arn`.
    ///
    /// No network call is made.
    pub fn new(client: C, function_arn: &str) -> InvokerResult<Self> {
        client.check_client().map_err(InvokerError::InvalidClient)?;
        let function_arn = FunctionArn::parse(function_arn).map_err(|source| {
            InvokerError::InvalidFunctionHandle {
                function_arn: function_arn.to_string(),
                source,
            }
        })?;
        Ok(LambdaProxyInvoker {
            client,
            function_arn,
        })
    }

    pub fn function_arn(&self) -> &FunctionArn {
        &self.function_arn
    }

    /// Sends the request document and checks the invocation-level contract of `mode`.
    ///
    /// Returns the raw response payload.
    async fn dispatch(
        &self,
        mode: InvocationMode,
        http_method: &str,
        path: &str,
        body: &[u8],
    ) -> InvokerResult<Vec<u8>> {
        let request = ProxyRequest::new(http_method, path, body);
        let payload = serde_json::to_vec(&request)?;

        LAMBDA_PROXY_METRICS
            .request_payload_size_bytes
            .observe(payload.len() as f64);

        debug!(payload_size = payload.len(), "invoking Lambda function");

        let outcome = self
            .client
            .invoke_function(self.function_arn.as_str(), mode, payload)
            .await
            .map_err(InvokerError::Dispatch)?;

        if let Some(function_error) = outcome.function_error {
            return Err(InvokerError::FunctionExecution {
                function_error,
                payload: String::from_utf8_lossy(&outcome.payload).into_owned(),
            });
        }
        let expected = mode.expected_status_code();

        if outcome.status_code != expected {
            return Err(InvokerError::UnexpectedStatus {
                status_code: outcome.status_code,
                expected,
            });
        }
        LAMBDA_PROXY_METRICS
            .response_payload_size_bytes
            .observe(outcome.payload.len() as f64);

        Ok(outcome.payload)
    }

    async fn invoke_sync(&self, http_method: &str, path: &str, body: &[u8]) -> InvokerResult<String> {
        let payload = self
            .dispatch(InvocationMode::Sync, http_method, path, body)
            .await?;

        if payload.is_empty() {
            return Err(InvokerError::EmptyPayload);
        }
        let response: ProxyResponse = serde_json::from_slice(&payload)?;

        if response.status_code != INNER_STATUS_OK {
            return Err(InvokerError::UnexpectedInnerStatus {
                status_code: response.status_code,
                body: response.body,
            });
        }
        debug!(body_size = response.body.len(), "lambda invocation completed");
        Ok(response.body)
    }

    async fn invoke_event(&self, http_method: &str, path: &str, body: &[u8]) -> InvokerResult<()> {
        let payload = self
            .dispatch(InvocationMode::Async, http_method, path, body)
            .await?;

        if !payload.is_empty() {
            return Err(InvokerError::UnexpectedPayload {
                payload: String::from_utf8_lossy(&payload).into_owned(),
            });
        }
        debug!("lambda invocation accepted");
        Ok(())
    }
}

fn record_invocation<T>(mode: InvocationMode, start: Instant, result: &InvokerResult<T>) {
    let elapsed = start.elapsed().as_secs_f64();
    let status = match result {
        Ok(_) => "success",
        Err(error) => error.kind().label_value(),
    };
    LAMBDA_PROXY_METRICS
        .invocations_total
        .with_label_values(&[mode.label_value(), status])
        .inc();
    LAMBDA_PROXY_METRICS
        .invocation_duration_seconds
        .with_label_values(&[mode.label_value(), status])
        .observe(elapsed);
}

#[async_trait]
impl<C: LambdaInvoke> FunctionInvoker for LambdaProxyInvoker<C> {
    #[instrument(skip(self, body), fields(function_arn = %self.function_arn, mode = "sync"))]
    async fn invoke(&self, http_method: &str, path: &str, body: &[u8]) -> InvokerResult<String> {
        let start = Instant::now();
        let result = self.invoke_sync(http_method, path, body).await;
        record_invocation(InvocationMode::Sync, start, &result);
        result
    }

    #[instrument(skip(self, body), fields(function_arn = %self.function_arn, mode = "async"))]
    async fn invoke_async(&self, http_method: &str, path: &str, body: &[u8]) -> InvokerResult<()> {
        let start = Instant::now();
        let result = self.invoke_event(http_method, path, body).await;
        record_invocation(InvocationMode::Async, start, &result);
        result
    }
}
