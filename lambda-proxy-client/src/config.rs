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

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, bail};
use lambda_proxy_aws::{LambdaClientConfig, build_lambda_client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arn::FunctionArn;
use crate::error::{InvokerError, InvokerResult};
use crate::invoker::LambdaProxyInvoker;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }

    pub fn sniff_from_path(path: &Path) -> anyhow::Result<ConfigFormat> {
        let extension_str: &str = path
            .extension()
            .and_then(|extension| extension.to_str())
            .with_context(|| {
                format!(
                    "failed to read config file `{}`: file extension is missing. Supported file \
                     formats and extensions are JSON (.json) and YAML (.yaml or .yml)",
                    path.display()
                )
            })?;
        ConfigFormat::from_str(extension_str).with_context(|| {
            format!(
                "failed to identify configuration file format `{}`",
                path.display()
            )
        })
    }

    pub fn parse<T>(&self, payload: &[u8]) -> anyhow::Result<T>
    where T: DeserializeOwned {
        match self {
            ConfigFormat::Json => serde_json::from_slice(payload).context("failed to read JSON file"),
            ConfigFormat::Yaml => serde_yaml::from_slice(payload).context("failed to read YAML file"),
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = anyhow::Error;

    fn from_str(extension: &str) -> anyhow::Result<Self> {
        match extension {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => bail!(
                "file extension `.{extension}` is not supported. Supported file formats and \
                 extensions are JSON (.json) and YAML (.yaml or .yml)",
            ),
        }
    }
}

/// Configuration of a [`LambdaProxyInvoker`] backed by the AWS SDK.
///
/// ```yaml
/// function_arn: arn:aws:lambda:eu-central-1:000000000000:function:my-function
/// client:
///   endpoint: http://localhost:4566
///   credentials:
///     access_key_id: test
///     secret_access_key: test
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LambdaProxyConfig {
    pub function_arn: String,
    #[serde(default)]
    pub client: LambdaClientConfig,
}

impl LambdaProxyConfig {
    pub fn load(config_format: ConfigFormat, payload: &[u8]) -> anyhow::Result<Self> {
        let config: LambdaProxyConfig = config_format.parse(payload)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let config_format = ConfigFormat::sniff_from_path(path)?;
        let payload = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read config file `{}`", path.display()))?;
        LambdaProxyConfig::load(config_format, &payload)
    }

    /// Checks the function ARN without building any client.
    pub fn validate(&self) -> InvokerResult<()> {
        FunctionArn::parse(&self.function_arn).map_err(|source| {
            InvokerError::InvalidFunctionHandle {
                function_arn: self.function_arn.clone(),
                source,
            }
        })?;
        Ok(())
    }
}

/// Builds an AWS Lambda client from `config` and binds it to the configured function.
pub async fn build_invoker(config: &LambdaProxyConfig) -> InvokerResult<LambdaProxyInvoker> {
    let client = build_lambda_client(&config.client).await;
    let invoker = LambdaProxyInvoker::new(client, &config.function_arn)?;
    info!(function_arn = %invoker.function_arn(), "created the lambda proxy invoker");
    Ok(invoker)
}
