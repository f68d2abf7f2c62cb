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
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const ARN_PREFIX: &str = "arn:";

const NUM_ARN_SECTIONS: usize = 6;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum ArnParseError {
    #[error("ARN must start with `arn:`")]
    InvalidPrefix,
    #[error("ARN must have 6 `:`-separated sections")]
    NotEnoughSections,
    #[error("ARN {0} must not be empty")]
    MissingComponent(&'static str),
}

/// Amazon Resource Name identifying the remote function.
///
/// `arn:<partition>:<service>:<region>:<account-id>:<resource-type>(:|/)<resource-id>`
///
/// Every component is required. The resource id may contain further `:`, which is how Lambda
/// qualifiers (versions, aliases) are expressed, e.g.
/// `arn:aws:lambda:eu-central-1:000000000000:function:my-function:live`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct FunctionArn {
    arn: String,
    // Byte offsets of the five `:` delimiting the sections, plus the resource type delimiter.
    delimiters: [usize; NUM_ARN_SECTIONS],
}

impl FunctionArn {
    pub fn parse(arn: &str) -> Result<FunctionArn, ArnParseError> {
        if !arn.starts_with(ARN_PREFIX) {
            return Err(ArnParseError::InvalidPrefix);
        }
        let mut delimiters = [0; NUM_ARN_SECTIONS];
        let mut section_delimiters = arn.match_indices(':').map(|(idx, _)| idx);

        for delimiter in delimiters.iter_mut().take(NUM_ARN_SECTIONS - 1) {
            *delimiter = section_delimiters
                .next()
                .ok_or(ArnParseError::NotEnoughSections)?;
        }
        let resource_start = delimiters[4] + 1;
        let resource_type_len = arn[resource_start..]
            .find([':', '/'])
            .ok_or(ArnParseError::MissingComponent("resource id"))?;
        delimiters[5] = resource_start + resource_type_len;

        let function_arn = FunctionArn {
            arn: arn.to_string(),
            delimiters,
        };
        let components = [
            ("partition", function_arn.partition()),
            ("service", function_arn.service()),
            ("region", function_arn.region()),
            ("account id", function_arn.account_id()),
            ("resource type", function_arn.resource_type()),
            ("resource id", function_arn.resource_id()),
        ];
        for (component_name, component) in components {
            if component.is_empty() {
                return Err(ArnParseError::MissingComponent(component_name));
            }
        }
        Ok(function_arn)
    }

    fn section(&self, ord: usize) -> &str {
        let start = self.delimiters[ord - 1] + 1;
        let end = self.delimiters[ord];
        &self.arn[start..end]
    }

    pub fn partition(&self) -> &str {
        self.section(1)
    }

    pub fn service(&self) -> &str {
        self.section(2)
    }

    pub fn region(&self) -> &str {
        self.section(3)
    }

    pub fn account_id(&self) -> &str {
        self.section(4)
    }

    /// The full resource section, e.g. `function:my-function`.
    pub fn resource(&self) -> &str {
        &self.arn[self.delimiters[4] + 1..]
    }

    pub fn resource_type(&self) -> &str {
        self.section(5)
    }

    pub fn resource_id(&self) -> &str {
        &self.arn[self.delimiters[5] + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.arn
    }
}

impl FromStr for FunctionArn {
    type Err = ArnParseError;

    fn from_str(arn: &str) -> Result<Self, Self::Err> {
        FunctionArn::parse(arn)
    }
}

impl fmt::Display for FunctionArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn)
    }
}

impl fmt::Debug for FunctionArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionArn({})", self.arn)
    }
}

impl Serialize for FunctionArn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.arn)
    }
}

impl<'de> Deserialize<'de> for FunctionArn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let arn = String::deserialize(deserializer)?;
        FunctionArn::parse(&arn).map_err(serde::de::Error::custom)
    }
}
