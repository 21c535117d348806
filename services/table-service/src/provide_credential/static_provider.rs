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

use async_trait::async_trait;
use aztables_core::time::DateTime;
use aztables_core::{Context, ProvideCredential, Result};

use crate::credential::Credential;

/// Always returns the same bearer token.
///
/// Useful for tests and for callers that obtain tokens out of band.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Create a provider for a token without known expiry.
    pub fn new(token: &str) -> Self {
        Self {
            credential: Credential::with_bearer_token(token, None),
        }
    }

    /// Set the expiry of the token.
    pub fn with_expires_on(mut self, expires_on: DateTime) -> Self {
        self.credential.expires_on = Some(expires_on);
        self
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}
