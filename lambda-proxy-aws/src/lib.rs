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

//! Builds AWS Lambda clients from an explicit configuration.
//!
//! Region, endpoint and credentials are always passed in through
//! [`LambdaClientConfig`]. Nothing in this crate writes to the process
//! environment.

use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_config::stalled_stream_protection::StalledStreamProtectionConfig;
use aws_credential_types::Credentials;
use aws_smithy_async::rt::sleep::TokioSleep;
use aws_types::region::Region;
use tokio::sync::OnceCell;
use tracing::debug;

mod config;

pub use config::{LambdaClientConfig, RegionOrEndpoint, StaticCredentialsConfig};

pub const DEFAULT_AWS_REGION: Region = Region::from_static("us-east-1");

const CREDENTIALS_PROVIDER_NAME: &str = "lambda-proxy-static";

/// Initialises and returns the shared AWS config.
///
/// SDK level retries are disabled: an invocation is attempted exactly once and
/// retry policy is left to the caller.
pub async fn load_sdk_config() -> &'static aws_config::SdkConfig {
    static SDK_CONFIG: OnceCell<aws_config::SdkConfig> = OnceCell::const_new();

    SDK_CONFIG
        .get_or_init(|| async {
            aws_config::defaults(BehaviorVersion::latest())
                .stalled_stream_protection(StalledStreamProtectionConfig::enabled().build())
                .retry_config(RetryConfig::disabled())
                .sleep_impl(TokioSleep::default())
                .load()
                .await
        })
        .await
}

/// Builds a Lambda client on top of the shared AWS config, applying the region, endpoint and
/// credentials overrides of `client_config`.
pub async fn build_lambda_client(client_config: &LambdaClientConfig) -> aws_sdk_lambda::Client {
    let sdk_config = load_sdk_config().await;
    lambda_client_from_sdk_config(sdk_config, client_config)
}

/// Same as [`build_lambda_client`] with an explicit base config.
pub fn lambda_client_from_sdk_config(
    sdk_config: &aws_config::SdkConfig,
    client_config: &LambdaClientConfig,
) -> aws_sdk_lambda::Client {
    let mut lambda_config = aws_sdk_lambda::config::Builder::from(sdk_config)
        .retry_config(RetryConfig::disabled());

    match &client_config.region_or_endpoint {
        Some(RegionOrEndpoint::Region(region)) => {
            lambda_config = lambda_config.region(Region::new(region.clone()));
        }
        Some(RegionOrEndpoint::Endpoint(endpoint)) => {
            lambda_config = lambda_config
                .endpoint_url(endpoint.clone())
                .region(DEFAULT_AWS_REGION);
        }
        None => {}
    }
    if let Some(credentials_config) = &client_config.credentials {
        let credentials = Credentials::new(
            credentials_config.access_key_id.clone(),
            credentials_config.secret_access_key.clone(),
            credentials_config.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );
        lambda_config = lambda_config.credentials_provider(credentials);
    }
    debug!(
        region_or_endpoint = ?client_config.region_or_endpoint,
        static_credentials = client_config.credentials.is_some(),
        "building Lambda client"
    );
    aws_sdk_lambda::Client::from_conf(lambda_config.build())
}
