use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::token::{IssuedToken, RequestType, TrustRequest};
use crate::transport::{ProtocolTransport, TransportError, TrustResponse};

/// Posts the trust envelope as JSON to a single issuer endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    issuer: Url,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelRequest<'a> {
    request_type: RequestType,
    context: String,
    cancel_target: &'a str,
}

impl HttpTransport {
    pub fn new(client: Client, issuer: Url) -> Self {
        Self { client, issuer }
    }

    /// Client with a request timeout; the provider still bounds each call itself.
    pub fn with_timeout(issuer: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self::new(client, issuer))
    }

    pub fn issuer(&self) -> &Url {
        &self.issuer
    }
}

impl ProtocolTransport for HttpTransport {
    async fn issue(&self, request: &TrustRequest) -> Result<TrustResponse, TransportError> {
        debug!(issuer = %self.issuer, context = request.context(), "sending trust request");
        let response = self
            .client
            .post(self.issuer.clone())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        serde_json::from_str::<TrustResponse>(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn cancel(&self, token: &IssuedToken) -> Result<(), TransportError> {
        let envelope = CancelRequest {
            request_type: RequestType::Cancel,
            context: format!("urn:uuid:{}", Uuid::new_v4()),
            cancel_target: token.identifier().as_str(),
        };
        let response = self
            .client
            .post(self.issuer.clone())
            .json(&envelope)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(issuer = %self.issuer, status = %response.status(), "cancel request rejected");
            return Err(TransportError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
