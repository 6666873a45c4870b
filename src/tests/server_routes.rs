// Serves configured targets over HTTP against a mocked STS:
//  - GET /targets/{name}/token acquires once, then serves from cache
//  - DELETE /targets/{name}/token evicts the cached token
//  - unknown targets and issuer failures map to 404 / 502

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use http::StatusCode;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use reqwest::Client;
    use serde_json::{json, Value};

    use crate::config::proc_loader::parse_config;
    use crate::config::settings::ProviderSettings;
    use crate::config::targets::ServiceConfig;
    use crate::provider::TokenProvider;
    use crate::resilience::retry::RetrySettings;
    use crate::server::server::router;
    use crate::server::tokens::TokenState;
    use crate::tests::common::spawn_axum;
    use crate::token::request::parse_uri;
    use crate::transport::HttpTransport;

    async fn service_config(sts_url: &str) -> ServiceConfig {
        let yaml = format!(
            r#"
settings:
  issuer:
    url: "{}"
    timeout_ms: 2000
  metrics:
    is_enabled: true
targets:
  billing:
    applies_to: "https://billing.example"
    key_type: bearer
    token_type: saml2
"#,
            sts_url
        );
        parse_config(yaml).await.unwrap()
    }

    async fn start(config: &ServiceConfig, retry: RetrySettings) -> String {
        let settings = &config.settings;
        let issuer = parse_uri("settings.issuer.url", &settings.issuer.url).unwrap();
        let transport = HttpTransport::with_timeout(issuer, settings.issuer.timeout()).unwrap();
        let provider = TokenProvider::new(ProviderSettings::try_from(&settings.provider).unwrap(), transport);
        let tokens = TokenState::new(
            Arc::new(provider),
            config.requirements().unwrap(),
            settings.issuer.timeout(),
            retry,
        );

        let (_handle, addr) = spawn_axum(router(settings, tokens).await).await;
        format!("http://{}", addr)
    }

    fn single_attempt() -> RetrySettings {
        RetrySettings { attempts: 1, base_delay_ms: 1, max_delay_ms: 1 }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn token_is_served_cached_and_canceled() {
        let sts = MockServer::start_async().await;
        let mock = sts
            .mock_async(|when, then| {
                when.method(POST).path("/trust");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({
                        "requestSecurityTokenResponses": [{
                            "requestedSecurityToken": "<Assertion/>",
                            "requestedAttachedReference": "_billing"
                        }]
                    }));
            })
            .await;

        let config = service_config(&sts.url("/trust")).await;
        let base = start(&config, single_attempt()).await;
        let client = Client::new();
        let token_url = format!("{}/targets/billing/token", base);

        let first: Value = client.get(&token_url).send().await.unwrap().json().await.unwrap();
        let second = client.get(&token_url).send().await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        let second: Value = second.json().await.unwrap();

        mock.assert_async().await;
        assert_eq!(first["token"], "<Assertion/>");
        assert_eq!(first["identifier"], "_billing");
        assert_eq!(first["target"], "billing");
        assert_eq!(first["token_type"], "saml2");
        assert_eq!(first["has_proof_key"], false);
        assert_eq!(first, second);

        let deleted = client.delete(&token_url).send().await.unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        let deleted_again = client.delete(&token_url).send().await.unwrap();
        assert_eq!(deleted_again.status(), StatusCode::NOT_FOUND);

        let metrics = client
            .get(format!("{}{}", base, config.settings.metrics.path))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(metrics.contains("stsprovider_token_acquisitions_total"));
        assert!(metrics.contains("stsprovider_token_cancellations_total"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unknown_target_is_not_found() {
        let sts = MockServer::start_async().await;
        let config = service_config(&sts.url("/trust")).await;
        let base = start(&config, single_attempt()).await;
        let client = Client::new();

        let get = client.get(format!("{}/targets/payroll/token", base)).send().await.unwrap();
        assert_eq!(get.status(), StatusCode::NOT_FOUND);
        let delete = client.delete(format!("{}/targets/payroll/token", base)).send().await.unwrap();
        assert_eq!(delete.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn issuer_failure_is_bad_gateway_after_retries() {
        let sts = MockServer::start_async().await;
        sts.mock_async(|when, then| {
            when.method(POST).path("/trust");
            then.status(503);
        })
        .await;

        let config = service_config(&sts.url("/trust")).await;
        let retry = RetrySettings { attempts: 2, base_delay_ms: 1, max_delay_ms: 5 };
        let base = start(&config, retry).await;

        let response = Client::new()
            .get(format!("{}/targets/billing/token", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.text().await.unwrap().contains("503"));
    }
}
