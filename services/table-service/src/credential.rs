// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use aztables_core::time::{now, DateTime};
use aztables_core::utils::Redact;
use aztables_core::SigningCredential;
use std::fmt::{Debug, Formatter};

/// Bearer token for the storage audience.
#[derive(Clone)]
pub struct Credential {
    /// Access token.
    pub token: String,
    /// Expiration time for this credential, `None` if unknown.
    pub expires_on: Option<DateTime>,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &Redact::from(&self.token))
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        if self.token.is_empty() {
            return false;
        }
        // Take 20s as buffer to avoid edge cases.
        match self.expires_on {
            Some(expires) => expires > now() + chrono::TimeDelta::try_seconds(20).expect("in bounds"),
            None => true,
        }
    }
}

impl Credential {
    /// Create a new bearer token credential.
    pub fn with_bearer_token(token: &str, expires_on: Option<DateTime>) -> Self {
        Self {
            token: token.to_string(),
            expires_on,
        }
    }
}
