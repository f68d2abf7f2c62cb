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

//! Provisioning helpers used to stand up test functions.
//!
//! These are not part of the invoker's contract. They create a function from a single source
//! file, wait for it to become invocable and delete it afterwards.

use std::io::{Cursor, Write};
use std::time::Duration;

use anyhow::Context;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime, State};
use tracing::info;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Everything needed to create a function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub function_name: String,
    pub runtime: Runtime,
    /// `<module>.<function>`, e.g. `index.handler`.
    pub handler: String,
    pub role_arn: String,
    /// Zipped function code, see [`package_function_code`].
    pub zip_file: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct WaitParams {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for WaitParams {
    fn default() -> Self {
        WaitParams {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

/// Zips a single source file into an in-memory archive.
pub fn package_function_code(file_name: &str, source: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o755);

    zip.start_file(file_name, options)
        .with_context(|| format!("failed to add `{file_name}` to the archive"))?;
    zip.write_all(source)
        .context("failed to write function code to the archive")?;
    let cursor = zip.finish().context("failed to finalize the archive")?;
    Ok(cursor.into_inner())
}

/// Creates the function and returns its ARN.
///
/// The function is usually not invocable right away, see [`wait_for_function_active`].
pub async fn create_function(
    client: &LambdaClient,
    function_spec: &FunctionSpec,
) -> anyhow::Result<String> {
    info!(
        function_name = %function_spec.function_name,
        runtime = function_spec.runtime.as_str(),
        "creating Lambda function"
    );
    let function_code = FunctionCode::builder()
        .zip_file(Blob::new(function_spec.zip_file.clone()))
        .build();

    let output = client
        .create_function()
        .function_name(&function_spec.function_name)
        .runtime(function_spec.runtime.clone())
        .role(&function_spec.role_arn)
        .handler(&function_spec.handler)
        .code(function_code)
        .send()
        .await
        .with_context(|| {
            format!(
                "failed to create Lambda function `{}`",
                function_spec.function_name
            )
        })?;

    let function_arn = output
        .function_arn()
        .context("created function has no ARN")?
        .to_string();
    Ok(function_arn)
}

/// Polls the function until its state is `Active`.
///
/// Fails if the function reaches the `Failed` state or is still not active after
/// `wait_params.max_attempts` polls.
pub async fn wait_for_function_active(
    client: &LambdaClient,
    function_name: &str,
    wait_params: &WaitParams,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(wait_params.interval);

    for attempt in 0..wait_params.max_attempts {
        interval.tick().await;

        let response = client
            .get_function()
            .function_name(function_name)
            .send()
            .await
            .context("failed to get function status")?;

        let Some(config) = response.configuration() else {
            continue;
        };
        match config.state() {
            Some(State::Active) => {
                info!(
                    function_name = %function_name,
                    attempts = attempt + 1,
                    "lambda function is active"
                );
                return Ok(());
            }
            Some(State::Failed) => {
                let reason = config.state_reason().unwrap_or("unknown reason");
                anyhow::bail!(
                    "lambda function '{}' is in Failed state: {}",
                    function_name,
                    reason
                );
            }
            state => {
                info!(
                    function_name = %function_name,
                    state = ?state,
                    attempt = attempt + 1,
                    "waiting for Lambda function to be active"
                );
            }
        }
    }
    anyhow::bail!(
        "lambda function '{}' did not become active after {} attempts",
        function_name,
        wait_params.max_attempts
    )
}

pub async fn delete_function(client: &LambdaClient, function_name: &str) -> anyhow::Result<()> {
    client
        .delete_function()
        .function_name(function_name)
        .send()
        .await
        .with_context(|| format!("failed to delete Lambda function `{function_name}`"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use aws_sdk_lambda::operation::create_function::{CreateFunctionError, CreateFunctionOutput};
    use aws_sdk_lambda::operation::get_function::GetFunctionOutput;
    use aws_sdk_lambda::types::FunctionConfiguration;
    use aws_sdk_lambda::types::error::ResourceConflictException;
    use aws_smithy_mocks::{RuleMode, mock, mock_client};

    use super::*;

    fn function_state_output(state: State) -> GetFunctionOutput {
        GetFunctionOutput::builder()
            .configuration(FunctionConfiguration::builder().state(state).build())
            .build()
    }

    fn test_function_spec() -> FunctionSpec {
        FunctionSpec {
            function_name: "my-function".to_string(),
            runtime: Runtime::Python312,
            handler: "index.handler".to_string(),
            role_arn: "arn:aws:iam::000000000000:role/lambda-role".to_string(),
            zip_file: package_function_code("index.py", b"def handler(event, context): pass")
                .unwrap(),
        }
    }

    #[test]
    fn test_package_function_code() {
        let source = b"def handler(event, context):\n    return {}\n";
        let zip_file = package_function_code("index.py", source).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(zip_file)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("index.py").unwrap();
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        let mut unzipped = Vec::new();
        entry.read_to_end(&mut unzipped).unwrap();
        assert_eq!(unzipped, source);
    }

    #[tokio::test]
    async fn test_create_function() {
        let rule = mock!(aws_sdk_lambda::Client::create_function)
            .match_requests(|request| {
                request.function_name() == Some("my-function")
                    && request.handler() == Some("index.handler")
                    && request.runtime() == Some(&Runtime::Python312)
            })
            .then_output(|| {
                CreateFunctionOutput::builder()
                    .function_name("my-function")
                    .function_arn("arn:aws:lambda:us-east-1:000000000000:function:my-function")
                    .state(State::Pending)
                    .build()
            });
        let client = mock_client!(aws_sdk_lambda, [&rule]);

        let function_arn = create_function(&client, &test_function_spec())
            .await
            .unwrap();
        assert_eq!(
            function_arn,
            "arn:aws:lambda:us-east-1:000000000000:function:my-function"
        );
    }

    #[tokio::test]
    async fn test_create_function_already_exists() {
        let rule = mock!(aws_sdk_lambda::Client::create_function).then_error(|| {
            CreateFunctionError::ResourceConflictException(
                ResourceConflictException::builder().build(),
            )
        });
        let client = mock_client!(aws_sdk_lambda, [&rule]);

        let error = create_function(&client, &test_function_spec())
            .await
            .unwrap_err();
        assert!(
            error.to_string().contains("failed to create Lambda function"),
            "unexpected error: {}",
            error
        );
    }

    #[tokio::test]
    async fn test_wait_for_function_active_immediate() {
        let rule = mock!(aws_sdk_lambda::Client::get_function)
            .then_output(|| function_state_output(State::Active));
        let client = mock_client!(aws_sdk_lambda, [&rule]);

        tokio::time::pause();
        wait_for_function_active(&client, "my-function", &WaitParams::default())
            .await
            .unwrap();
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_function_active_after_pending() {
        let rule = mock!(aws_sdk_lambda::Client::get_function)
            .sequence()
            .output(|| function_state_output(State::Pending))
            .output(|| GetFunctionOutput::builder().build())
            .output(|| function_state_output(State::Active))
            .build();
        let client = mock_client!(aws_sdk_lambda, RuleMode::Sequential, [&rule]);

        tokio::time::pause();
        wait_for_function_active(&client, "my-function", &WaitParams::default())
            .await
            .unwrap();
        assert_eq!(rule.num_calls(), 3);
    }

    #[tokio::test]
    async fn test_wait_for_function_active_fails_on_failed_state() {
        let rule = mock!(aws_sdk_lambda::Client::get_function).then_output(|| {
            GetFunctionOutput::builder()
                .configuration(
                    FunctionConfiguration::builder()
                        .state(State::Failed)
                        .state_reason("Something broke")
                        .build(),
                )
                .build()
        });
        let client = mock_client!(aws_sdk_lambda, [&rule]);

        tokio::time::pause();
        let error = wait_for_function_active(&client, "my-function", &WaitParams::default())
            .await
            .unwrap_err();
        assert!(
            error.to_string().contains("Something broke"),
            "unexpected error: {}",
            error
        );
    }

    #[tokio::test]
    async fn test_wait_for_function_active_gives_up() {
        let rule = mock!(aws_sdk_lambda::Client::get_function)
            .then_output(|| function_state_output(State::Pending));
        let client = mock_client!(aws_sdk_lambda, RuleMode::MatchAny, [&rule]);
        let wait_params = WaitParams {
            interval: Duration::from_millis(100),
            max_attempts: 3,
        };

        tokio::time::pause();
        let error = wait_for_function_active(&client, "my-function", &wait_params)
            .await
            .unwrap_err();
        assert!(
            error.to_string().contains("did not become active"),
            "unexpected error: {}",
            error
        );
        assert_eq!(rule.num_calls(), 3);
    }
}
