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

//! API-Gateway-proxy shaped documents exchanged with the remote function.

use serde::{Deserialize, Deserializer, Serialize};

/// Request document sent as the invocation payload.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    pub path: String,
    pub http_method: String,
    pub body: String,
}

impl ProxyRequest {
    /// Invalid UTF-8 sequences in `body` are replaced with `U+FFFD`.
    pub fn new(http_method: &str, path: &str, body: &[u8]) -> Self {
        ProxyRequest {
            path: path.to_string(),
            http_method: http_method.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

/// Response document returned by the remote function on synchronous invocations.
///
/// Missing and `null` fields are defaulted. Unknown fields (`headers`, `isBase64Encoded`, ...)
/// are ignored.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub status_code: i64,
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub body: String,
}

fn deserialize_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value_opt: Option<T> = Option::deserialize(deserializer)?;
    Ok(value_opt.unwrap_or_default())
}
