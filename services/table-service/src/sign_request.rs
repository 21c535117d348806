use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use aztables_core::time::{format_http_date, now, DateTime};
use aztables_core::{Context, Result, SignRequest};
use http::request::Parts;
use http::{header, HeaderValue};

/// RequestSigner applies OAuth bearer authorization to table service requests.
///
/// - [Authorize with Microsoft Entra ID](https://learn.microsoft.com/en-us/rest/api/storageservices/authorize-with-azure-active-directory)
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for the table service.
    pub fn new() -> Self {
        Self { time: None }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(&self, _: &Context, req: &mut Parts, cred: &Credential) -> Result<()> {
        let now_time = self.time.unwrap_or_else(now);

        req.headers
            .insert(X_MS_DATE, format_http_date(now_time).parse()?);
        if !req.headers.contains_key(X_MS_VERSION) {
            req.headers
                .insert(X_MS_VERSION, HeaderValue::from_static(TABLE_SERVICE_VERSION));
        }

        let mut value: HeaderValue = format!("Bearer {}", cred.token).parse()?;
        value.set_sensitive(true);
        req.headers.insert(header::AUTHORIZATION, value);

        Ok(())
    }
}
