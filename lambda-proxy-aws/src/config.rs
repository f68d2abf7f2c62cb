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

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionOrEndpoint {
    Region(String),
    Endpoint(String),
}

/// Static credentials, typically used against an emulated environment.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticCredentialsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl fmt::Debug for StaticCredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentialsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***redacted***")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "***redacted***"),
            )
            .finish()
    }
}

/// Configuration used to build the Lambda client.
///
/// `region` and `endpoint` are mutually exclusive. When neither is set, the region is resolved by
/// the default AWS provider chain. Credentials work the same way when `credentials` is not set.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LambdaClientConfigInner")]
pub struct LambdaClientConfig {
    #[serde(flatten)]
    pub region_or_endpoint: Option<RegionOrEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<StaticCredentialsConfig>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct LambdaClientConfigInner {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub credentials: Option<StaticCredentialsConfig>,
}

impl TryFrom<LambdaClientConfigInner> for LambdaClientConfig {
    type Error = &'static str;

    fn try_from(value: LambdaClientConfigInner) -> Result<Self, Self::Error> {
        if value.region.is_some() && value.endpoint.is_some() {
            return Err("Lambda client parameters `region` and `endpoint` are mutually exclusive.");
        }
        let region = value.region.map(RegionOrEndpoint::Region);
        let endpoint = value.endpoint.map(RegionOrEndpoint::Endpoint);
        let region_or_endpoint = region.or(endpoint);

        Ok(LambdaClientConfig {
            region_or_endpoint,
            credentials: value.credentials,
        })
    }
}
