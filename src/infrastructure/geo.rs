//! Geolocation adapters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::domain::geo::GeoLocator;
use crate::domain::kernel::Location;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct GeolocationResponse {
    location: Coordinates,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    x: i64,
    y: i64,
}

impl TryFrom<GeolocationResponse> for Location {
    type Error = AppError;

    fn try_from(response: GeolocationResponse) -> Result<Self, Self::Error> {
        let Coordinates { x, y } = response.location;
        let invalid = || {
            AppError::internal(
                "Geolocation service returned an invalid location",
                json!({ "source": "geolocation", "x": x, "y": y }),
            )
        };
        let x = u8::try_from(x).map_err(|_| invalid())?;
        let y = u8::try_from(y).map_err(|_| invalid())?;
        Location::new(x, y).map_err(|_| invalid())
    }
}

/// Client for the geolocation service.
///
/// Calls `GET {base_url}/api/v1/geolocation?street=...` and expects
/// `{"location": {"x": .., "y": ..}}`.
pub struct HttpGeoClient {
    base_url: String,
    timeout: Duration,
    http_client: Client,
}

impl HttpGeoClient {
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `base_url` is blank.
    pub fn new(base_url: &str, timeout: Duration, http_client: Client) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AppError::bad_request(
                "Geolocation service URL is required",
                json!({ "field": "GEO_SERVICE_URL" }),
            ));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            timeout,
            http_client,
        })
    }
}

#[async_trait]
impl GeoLocator for HttpGeoClient {
    #[tracing::instrument(skip(self))]
    async fn define_location(&self, street: &str) -> Result<Location, AppError> {
        let response = self
            .http_client
            .get(format!("{}/api/v1/geolocation", self.base_url))
            .query(&[("street", street)])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<GeolocationResponse>()
            .await?;

        response.try_into()
    }
}

/// Picks a random cell, for deployments without a geolocation service.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGeoLocator;

#[async_trait]
impl GeoLocator for RandomGeoLocator {
    async fn define_location(&self, street: &str) -> Result<Location, AppError> {
        let location = Location::random();
        tracing::debug!(street, x = location.x(), y = location.y(), "random location");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(x: i64, y: i64) -> GeolocationResponse {
        GeolocationResponse {
            location: Coordinates { x, y },
        }
    }

    #[test]
    fn test_response_to_location() {
        let location = Location::try_from(response(4, 9)).unwrap();
        assert_eq!(location, Location::new(4, 9).unwrap());
    }

    #[test]
    fn test_response_out_of_grid() {
        for (x, y) in [(0, 5), (5, 11), (-1, 3), (300, 3)] {
            let err = Location::try_from(response(x, y)).unwrap_err();
            assert!(matches!(err, AppError::Internal { .. }));
        }
    }

    #[test]
    fn test_response_parsing() {
        let parsed: GeolocationResponse =
            serde_json::from_str(r#"{"location":{"x":2,"y":3}}"#).unwrap();
        assert_eq!(Location::try_from(parsed).unwrap(), Location::new(2, 3).unwrap());
    }

    #[test]
    fn test_client_requires_url() {
        let err = HttpGeoClient::new("  ", Duration::from_secs(1), Client::new())
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_random_locator_stays_on_grid() {
        for _ in 0..50 {
            let location = RandomGeoLocator.define_location("anywhere").await.unwrap();
            assert!(!location.is_empty());
            assert!((1..=10).contains(&location.x()));
            assert!((1..=10).contains(&location.y()));
        }
    }
}
