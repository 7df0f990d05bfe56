use crate::extract::error::FetchError;
use crate::types::config::ForecastRequest;
use crate::types::response::OpenMeteoResponse;
use log::{info, warn};
use reqwest::{Client, Request};

/// Thin async client for the Open-Meteo forecast endpoint.
///
/// One call is one HTTP GET; there is no retry and no caching.
#[derive(Debug, Clone, Default)]
pub struct OpenMeteoClient {
    client: Client,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing `reqwest` client (connection pool, proxies, timeouts).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Builds the GET request for `request` without sending it.
    pub fn build_request(&self, request: &ForecastRequest) -> Result<Request, FetchError> {
        self.client
            .get(&request.base_url)
            .query(&request.query_pairs())
            .build()
            .map_err(|e| FetchError::InvalidRequest(request.base_url.clone(), e))
    }

    /// Downloads and decodes one forecast.
    ///
    /// # Errors
    ///
    /// * [`FetchError::NetworkRequest`] if the request could not be sent.
    /// * [`FetchError::HttpStatus`] on a non-2xx answer.
    /// * [`FetchError::Decode`] if the body is not a forecast JSON object.
    pub async fn fetch(&self, request: &ForecastRequest) -> Result<OpenMeteoResponse, FetchError> {
        let http_request = self.build_request(request)?;
        let url = http_request.url().to_string();
        info!("Requesting forecast from {}", url);

        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url, e)
                });
            }
        };

        let forecast = response
            .json::<OpenMeteoResponse>()
            .await
            .map_err(|e| FetchError::Decode(url.clone(), e))?;
        info!(
            "Received forecast for ({}, {}), timezone {}",
            forecast.latitude, forecast.longitude, forecast.timezone_abbreviation
        );
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FIXTURE_JSON;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(template: ResponseTemplate) -> (MockServer, ForecastRequest) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("timeformat", "unixtime"))
            .respond_with(template)
            .mount(&server)
            .await;
        let request = ForecastRequest::builder()
            .base_url(format!("{}/v1/forecast", server.uri()))
            .build();
        (server, request)
    }

    #[test]
    fn test_request_carries_every_query_parameter() -> Result<(), FetchError> {
        let client = OpenMeteoClient::new();
        let request = ForecastRequest::builder()
            .start_date(NaiveDate::from_ymd_opt(2025, 5, 28).unwrap())
            .end_date(NaiveDate::from_ymd_opt(2025, 5, 30).unwrap())
            .hourly(vec!["temperature_2m".into(), "wind_speed_10m".into()])
            .build();
        let http_request = client.build_request(&request)?;
        let url = http_request.url();

        assert_eq!(url.host_str(), Some("api.open-meteo.com"));
        assert_eq!(url.path(), "/v1/forecast");
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 11);
        assert_eq!(query["latitude"], "55.0344");
        assert_eq!(query["hourly"], "temperature_2m,wind_speed_10m");
        assert_eq!(query["daily"], "sunrise,sunset,daylight_duration");
        assert_eq!(query["timeformat"], "unixtime");
        assert_eq!(query["temperature_unit"], "fahrenheit");
        assert_eq!(query["precipitation_unit"], "inch");
        assert_eq!(query["start_date"], "2025-05-28");
        assert_eq!(query["end_date"], "2025-05-30");
        Ok(())
    }

    #[test]
    fn test_unparsable_base_url_is_rejected() {
        let client = OpenMeteoClient::new();
        let request = ForecastRequest::builder().base_url("not a url").build();
        assert!(matches!(
            client.build_request(&request),
            Err(FetchError::InvalidRequest(ref url, _)) if url == "not a url"
        ));
    }

    #[tokio::test]
    async fn test_fetch_maps_server_error_to_http_status() {
        let (_server, request) = serve(ResponseTemplate::new(500)).await;
        let result = OpenMeteoClient::new().fetch(&request).await;
        assert!(matches!(
            result,
            Err(FetchError::HttpStatus { status, .. }) if status.as_u16() == 500
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_body_that_is_not_a_forecast() {
        let (_server, request) =
            serve(ResponseTemplate::new(200).set_body_string(r#"{"foo":1}"#)).await;
        let result = OpenMeteoClient::new().fetch(&request).await;
        assert!(matches!(result, Err(FetchError::Decode(..))));
    }

    #[tokio::test]
    async fn test_fetch_decodes_forecast() -> Result<(), FetchError> {
        let (_server, request) =
            serve(ResponseTemplate::new(200).set_body_string(FIXTURE_JSON)).await;
        let forecast = OpenMeteoClient::new().fetch(&request).await?;
        assert_eq!(forecast.timezone_abbreviation, "GMT+7");
        assert_eq!(forecast.utc_offset_seconds, 25200);
        Ok(())
    }
}
