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

// See https://prometheus.io/docs/practices/naming/

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, exponential_buckets,
};

const NAMESPACE: &str = "lambda_proxy";
const SUBSYSTEM: &str = "invoker";

/// From 0.008s to 131s
fn duration_buckets() -> Vec<f64> {
    exponential_buckets(0.008, 2.0, 15).expect("duration buckets should be valid")
}

/// From 64B to 16MB
fn payload_size_buckets() -> Vec<f64> {
    exponential_buckets(64.0, 4.0, 10).expect("payload size buckets should be valid")
}

fn new_counter_vec(name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
    let counter_opts = Opts::new(name, help)
        .namespace(NAMESPACE)
        .subsystem(SUBSYSTEM);
    let counter_vec =
        IntCounterVec::new(counter_opts, label_names).expect("failed to create counter vec");
    prometheus::register(Box::new(counter_vec.clone())).expect("failed to register counter vec");
    counter_vec
}

fn new_histogram_vec(
    name: &str,
    help: &str,
    label_names: &[&str],
    buckets: Vec<f64>,
) -> HistogramVec {
    let histogram_opts = HistogramOpts::new(name, help)
        .namespace(NAMESPACE)
        .subsystem(SUBSYSTEM)
        .buckets(buckets);
    let histogram_vec =
        HistogramVec::new(histogram_opts, label_names).expect("failed to create histogram vec");
    prometheus::register(Box::new(histogram_vec.clone()))
        .expect("failed to register histogram vec");
    histogram_vec
}

fn new_histogram(name: &str, help: &str, buckets: Vec<f64>) -> Histogram {
    let histogram_opts = HistogramOpts::new(name, help)
        .namespace(NAMESPACE)
        .subsystem(SUBSYSTEM)
        .buckets(buckets);
    let histogram = Histogram::with_opts(histogram_opts).expect("failed to create histogram");
    prometheus::register(Box::new(histogram.clone())).expect("failed to register histogram");
    histogram
}

pub struct LambdaProxyMetrics {
    /// Labels: `mode`, `status`.
    pub invocations_total: IntCounterVec,
    /// Labels: `mode`, `status`.
    pub invocation_duration_seconds: HistogramVec,
    pub request_payload_size_bytes: Histogram,
    pub response_payload_size_bytes: Histogram,
}

impl Default for LambdaProxyMetrics {
    fn default() -> Self {
        LambdaProxyMetrics {
            invocations_total: new_counter_vec(
                "invocations_total",
                "Total number of Lambda invocations.",
                &["mode", "status"],
            ),
            invocation_duration_seconds: new_histogram_vec(
                "invocation_duration_seconds",
                "Duration of Lambda invocations in seconds.",
                &["mode", "status"],
                duration_buckets(),
            ),
            request_payload_size_bytes: new_histogram(
                "request_payload_size_bytes",
                "Size of the request payload sent to Lambda in bytes.",
                payload_size_buckets(),
            ),
            response_payload_size_bytes: new_histogram(
                "response_payload_size_bytes",
                "Size of the response payload received from Lambda in bytes.",
                payload_size_buckets(),
            ),
        }
    }
}

pub static LAMBDA_PROXY_METRICS: Lazy<LambdaProxyMetrics> = Lazy::new(LambdaProxyMetrics::default);
