#[cfg(test)]
mod test {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;
    use url::Url;

    use crate::config::settings::ProviderSettings;
    use crate::provider::TokenProvider;
    use crate::tests::common::{svc_requirement, token_between, TEST_TIMEOUT};
    use crate::token::{KeyType, TrustRequest};
    use crate::transport::{HttpTransport, ProtocolTransport, TransportError};

    const STS_PATH: &str = "/trust/13/issue";

    fn transport(server: &MockServer) -> HttpTransport {
        let issuer = Url::parse(&server.url(STS_PATH)).unwrap();
        HttpTransport::with_timeout(issuer, Duration::from_secs(2)).unwrap()
    }

    fn sts_body() -> serde_json::Value {
        json!({
            "requestSecurityTokenResponses": [{
                "tokenType": "urn:oasis:names:tc:SAML:2.0:assertion",
                "requestedSecurityToken": "<saml:Assertion ID=\"_9f8e\"/>",
                "requestedAttachedReference": "_9f8e",
                "lifetime": {
                    "created": "2026-01-01T00:00:00Z",
                    "expires": "2099-01-01T00:00:00Z"
                }
            }]
        })
    }

    #[tokio::test]
    async fn issue_posts_request_and_decodes_collection() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(STS_PATH)
                    .header("content-type", "application/json");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(sts_body());
            })
            .await;

        let request = TrustRequest::new("issue", "https://svc.example", KeyType::Bearer, "saml2").unwrap();
        let response = transport(&server).issue(&request).await.unwrap();
        mock.assert_async().await;

        assert!(response.context.is_none());
        assert_eq!(response.entries.len(), 1);
        let entry = &response.entries[0];
        assert_eq!(entry.requested_attached_reference.as_deref(), Some("_9f8e"));
        let lifetime = entry.lifetime.as_ref().unwrap();
        assert_eq!(lifetime.created, Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn provider_over_http_reaches_issuer_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(STS_PATH);
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(sts_body());
            })
            .await;

        let provider = TokenProvider::new(ProviderSettings::default(), transport(&server));
        let requirement = svc_requirement();

        let first = provider.acquire_token(&requirement, TEST_TIMEOUT).await.unwrap();
        let second = provider.acquire_token(&requirement, TEST_TIMEOUT).await.unwrap();

        mock.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(first.token_type(), Some("urn:oasis:names:tc:SAML:2.0:assertion"));
        assert_eq!(first.identifier().as_str(), "_9f8e");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(STS_PATH);
                then.status(500).body("wst:RequestFailed");
            })
            .await;

        let request = TrustRequest::new("issue", "https://svc.example", KeyType::Bearer, "saml2").unwrap();
        let err = transport(&server).issue(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Status(500)));
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(STS_PATH);
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let request = TrustRequest::new("issue", "https://svc.example", KeyType::Bearer, "saml2").unwrap();
        let err = transport(&server).issue(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_issuer_is_a_request_error() {
        // nothing listens on the discard port
        let issuer = Url::parse("http://127.0.0.1:9/trust").unwrap();
        let transport = HttpTransport::with_timeout(issuer, Duration::from_secs(2)).unwrap();

        let request = TrustRequest::new("issue", "https://svc.example", KeyType::Bearer, "saml2").unwrap();
        let err = transport.issue(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[tokio::test]
    async fn cancel_posts_cancel_envelope() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(STS_PATH);
                then.status(200);
            })
            .await;

        let now = Utc::now();
        let token = token_between("_9f8e", now, now + chrono::TimeDelta::hours(1));
        transport(&server).cancel(&token).await.unwrap();
        mock.assert_async().await;
    }
}
