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

/// Load credential from Azure Workload Identity.
///
/// Workloads running in Kubernetes exchange the federated token projected at
/// `AZURE_FEDERATED_TOKEN_FILE` for an access token.
///
/// Reference: <https://learn.microsoft.com/en-us/azure/aks/workload-identity-overview>
#[derive(Debug, Default, Clone)]
pub struct WorkloadIdentityCredentialProvider {
    tenant_id: Option<String>,
    client_id: Option<String>,
    federated_token_file: Option<String>,
}

impl WorkloadIdentityCredentialProvider {
    /// Create a new workload identity loader.
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

    /// Set the path of the federated token file.
    pub fn with_federated_token_file(mut self, path: impl Into<String>) -> Self {
        self.federated_token_file = Some(path.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for WorkloadIdentityCredentialProvider {
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
        let Some(token_file) = self
            .federated_token_file
            .clone()
            .or_else(|| ctx.env_var_non_empty(AZURE_FEDERATED_TOKEN_FILE))
        else {
            return Ok(None);
        };
        let authority_host = ctx
            .env_var_non_empty(AZURE_AUTHORITY_HOST)
            .unwrap_or_else(|| AZURE_PUBLIC_CLOUD.to_string());

        let federated_token = match ctx.file_read_as_string(&token_file).await {
            Ok(content) => content,
            Err(err) => {
                log::debug!("federated token file {token_file} is not readable: {err}");
                return Ok(None);
            }
        };
        let federated_token = federated_token.trim();
        if federated_token.is_empty() {
            return Ok(None);
        }

        let url = authority_url(&authority_host, &tenant_id, "token");
        let cred = request_token(
            ctx,
            "workload identity",
            &url,
            &[
                ("scope", STORAGE_SCOPE),
                ("client_id", client_id.as_str()),
                ("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT),
                ("client_assertion", federated_token),
                ("grant_type", "client_credentials"),
            ],
        )
        .await?;

        Ok(Some(cred))
    }
}
