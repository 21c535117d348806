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

use crate::constants::*;
use crate::token::{authority_url, request_token};
use crate::Credential;
use async_trait::async_trait;
use aztables_core::{Context, ProvideCredential, Result};

/// Load credential from Azure Client Secret.
///
/// This loader implements the OAuth2 client credentials flow for a service
/// principal. Values set on the provider take precedence over
/// `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and
/// `AZURE_AUTHORITY_HOST`.
///
/// Reference: <https://learn.microsoft.com/en-us/entra/identity-platform/v2-oauth2-client-creds-grant-flow>
#[derive(Debug, Default, Clone)]
pub struct ClientSecretCredentialProvider {
    tenant_id: Option<String>,
    client_id: Option<String>,
    authority_host: Option<String>,
}

impl ClientSecretCredentialProvider {
    /// Create a new client secret loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tenant ID.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the client ID.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the authority host.
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = Some(authority_host.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for ClientSecretCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let Some(tenant_id) = self
            .tenant_id
            .clone()
            .or_else(|| ctx.env_var_non_empty(AZURE_TENANT_ID))
        else {
            return Ok(None);
        };
        let Some(client_id) = self
            .client_id
            .clone()
            .or_else(|| ctx.env_var_non_empty(AZURE_CLIENT_ID))
        else {
            return Ok(None);
        };
        // Secret is read from env only.
        let Some(client_secret) = ctx.env_var_non_empty(AZURE_CLIENT_SECRET) else {
            return Ok(None);
        };
        let authority_host = self
            .authority_host
            .clone()
            .or_else(|| ctx.env_var_non_empty(AZURE_AUTHORITY_HOST))
            .unwrap_or_else(|| AZURE_PUBLIC_CLOUD.to_string());

        let url = authority_url(&authority_host, &tenant_id, "token");
        let cred = request_token(
            ctx,
            "client secret",
            &url,
            &[
                ("scope", STORAGE_SCOPE),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ],
        )
        .await?;

        Ok(Some(cred))
    }
}
