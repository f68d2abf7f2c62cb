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

//! Invoke AWS Lambda functions as if they were HTTP endpoints.
//!
//! Requests are wrapped into API Gateway proxy documents
//! (`{"path", "httpMethod", "body"}`) and responses are unwrapped from
//! `{"statusCode", "body"}` documents.
//!
//! # Usage
//!
//! ```ignore
//! let config = LambdaProxyConfig::load_from_file(Path::new("lambda.yaml")).await?;
//! let invoker = build_invoker(&config).await?;
//! let body = invoker.invoke("POST", "/path", br#"{"key":"value"}"#).await?;
//! ```

mod arn;
mod config;
mod envelope;
mod error;
mod invoke;
mod invoker;
mod metrics;
#[cfg(any(test, feature = "testsuite"))]
pub mod provision;

pub use arn::{ArnParseError, FunctionArn};
pub use config::{ConfigFormat, LambdaProxyConfig, build_invoker};
pub use envelope::{ProxyRequest, ProxyResponse};
pub use error::{BoxError, InvokerError, InvokerErrorKind, InvokerResult};
pub use invoke::{InvocationMode, InvokeOutcome, LambdaInvoke};
#[cfg(any(test, feature = "testsuite"))]
pub use invoker::MockFunctionInvoker;
pub use invoker::{FunctionInvoker, LambdaProxyInvoker};
pub use metrics::LAMBDA_PROXY_METRICS;
