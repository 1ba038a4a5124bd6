use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as ReqwestClient;
use std::time::Duration;

use crate::constants::CLIENT_TIMEOUT_DEFAULT_MILLIS;
use crate::models::errors::TelemetryError;

const APPLICATION_JSON: &str = "application/json";

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub(crate) struct HttpResponse {
    pub(crate) status: u16,
    pub(crate) body: String,
}

pub(crate) struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub(crate) fn new() -> Result<Self, TelemetryError> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_millis(CLIENT_TIMEOUT_DEFAULT_MILLIS))
            .build()
            .map_err(|e| TelemetryError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }

    /// Posts a JSON body with the given authorization header.
    /// Transport failures, including hitting `timeout`, are returned as errors; any http status is a response.
    pub(crate) async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: Vec<u8>,
        timeout: Duration,
    ) -> Result<HttpResponse, reqwest::Error> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(AUTHORIZATION, authorization)
            .timeout(timeout)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        // A body that can't be read doesn't change the status classification.
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_client_new() {
        HttpClient::new().expect("Error creating http client");
    }

    #[tokio::test]
    async fn test_post_json_sends_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/devices/d/messages/events"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "SharedAccessSignature sr=x"))
            .and(body_json(serde_json::json!({"vibration": 1.5})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .post_json(
                &format!("{}/devices/d/messages/events", mock_server.uri()),
                "SharedAccessSignature sr=x",
                br#"{"vibration":1.5}"#.to_vec(),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_post_json_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new().unwrap();
        let result = client
            .post_json(&mock_server.uri(), "sas", b"{}".to_vec(), Duration::from_millis(50))
            .await;

        assert!(result.unwrap_err().is_timeout());
    }
}
