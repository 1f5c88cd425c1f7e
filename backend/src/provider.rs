use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{Coordinate, TravelProfile};

/// Geometry and summary returned by a path provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    pub coordinates: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub instructions: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PathProviderError {
    #[error("no route found between the specified locations")]
    NotFound,
    #[error("path provider is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("at least two coordinates are required, got {0}")]
    TooFewCoordinates(usize),
    #[error("path provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("path provider returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },
    #[error("invalid path provider response: {0}")]
    Decode(String),
    #[error("path provider timed out after {0:?}")]
    Timeout(Duration),
}

/// Turn-by-turn routing engine treated as a black box.
///
/// # Contract
/// Implementations must:
/// - Accept two or more coordinates, visited in order
/// - Return exactly one geometry for the whole sequence
/// - Return `PathProviderError::NotFound` when no path exists
#[async_trait]
pub trait PathProvider: Send + Sync {
    async fn route(
        &self,
        coordinates: &[Coordinate],
        profile: TravelProfile,
    ) -> Result<ProviderRoute, PathProviderError>;
}

pub const DEFAULT_MAPBOX_BASE_URL: &str = "https://api.mapbox.com";

/// Mapbox Directions v5 client
pub struct MapboxPathProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl MapboxPathProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PathProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Directions URL without the access token.
    fn directions_url(&self, coordinates: &[Coordinate], profile: TravelProfile) -> String {
        let path = coordinates
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/directions/v5/mapbox/{}/{}",
            self.base_url,
            profile.as_str(),
            path
        )
    }

    fn classify(&self, err: reqwest::Error) -> PathProviderError {
        if err.is_timeout() {
            PathProviderError::Timeout(self.timeout)
        } else {
            PathProviderError::Transport(err)
        }
    }
}

#[async_trait]
impl PathProvider for MapboxPathProvider {
    async fn route(
        &self,
        coordinates: &[Coordinate],
        profile: TravelProfile,
    ) -> Result<ProviderRoute, PathProviderError> {
        if coordinates.len() < 2 {
            return Err(PathProviderError::TooFewCoordinates(coordinates.len()));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PathProviderError::NotConfigured("MAPBOX_API_KEY is not set"))?;

        let url = self.directions_url(coordinates, profile);
        tracing::debug!("requesting {} coordinate(s) from {url}", coordinates.len());

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", api_key),
                ("geometries", "geojson"),
                ("steps", "true"),
                ("overview", "full"),
                ("alternatives", "false"),
            ])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        route_from_response(status, body)
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: LineGeometry,
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    #[serde(default)]
    steps: Vec<DirectionsStep>,
}

#[derive(Debug, Deserialize)]
struct DirectionsStep {
    maneuver: Maneuver,
}

#[derive(Debug, Deserialize)]
struct Maneuver {
    #[serde(default)]
    instruction: Option<String>,
}

fn is_no_route_code(code: &str) -> bool {
    matches!(code, "NoRoute" | "NoSegment")
}

/// Map a Directions response, successful or not, to a route or error.
fn route_from_response(
    status: reqwest::StatusCode,
    body: String,
) -> Result<ProviderRoute, PathProviderError> {
    if !status.is_success() {
        // Mapbox reports unroutable input as 4xx with a NoRoute/NoSegment code
        if let Ok(parsed) = serde_json::from_str::<DirectionsResponse>(&body) {
            if is_no_route_code(&parsed.code) {
                return Err(PathProviderError::NotFound);
            }
        }
        tracing::error!("Mapbox API error {status}: {body}");
        return Err(PathProviderError::UpstreamStatus {
            status: status.as_u16(),
            message: body,
        });
    }

    let parsed: DirectionsResponse =
        serde_json::from_str(&body).map_err(|e| PathProviderError::Decode(e.to_string()))?;
    parse_directions(parsed)
}

fn parse_directions(response: DirectionsResponse) -> Result<ProviderRoute, PathProviderError> {
    if is_no_route_code(&response.code) {
        return Err(PathProviderError::NotFound);
    }
    if response.code != "Ok" {
        return Err(PathProviderError::Decode(format!(
            "unexpected code {}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(PathProviderError::NotFound)?;

    let instructions = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .filter_map(|step| step.maneuver.instruction)
        .collect();

    Ok(ProviderRoute {
        coordinates: route
            .geometry
            .coordinates
            .into_iter()
            .map(Coordinate::from_lng_lat)
            .collect(),
        distance_m: route.distance,
        duration_s: route.duration,
        instructions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LEG_RESPONSE: &str = r#"{
        "code": "Ok",
        "routes": [{
            "geometry": {
                "type": "LineString",
                "coordinates": [[144.9631, -37.8136], [144.9600, -37.8160], [144.9650, -37.8150]]
            },
            "distance": 612.4,
            "duration": 441.0,
            "legs": [
                {"steps": [
                    {"maneuver": {"instruction": "Head southwest on Swanston Street"}},
                    {"maneuver": {"instruction": "You have arrived at your 1st destination"}}
                ]},
                {"steps": [
                    {"maneuver": {"instruction": "Turn left onto Flinders Lane"}},
                    {"maneuver": {}}
                ]}
            ]
        }]
    }"#;

    fn provider(api_key: Option<&str>) -> MapboxPathProvider {
        MapboxPathProvider::new(
            "https://api.mapbox.test/",
            api_key.map(String::from),
            Duration::from_secs(1),
        )
        .expect("client")
    }

    #[test]
    fn parses_geometry_and_instructions_from_every_leg() {
        let parsed: DirectionsResponse = serde_json::from_str(TWO_LEG_RESPONSE).unwrap();
        let route = parse_directions(parsed).unwrap();

        assert_eq!(route.coordinates.len(), 3);
        assert_eq!(route.coordinates[0], Coordinate::new(-37.8136, 144.9631));
        assert_eq!(route.distance_m, 612.4);
        assert_eq!(route.duration_s, 441.0);
        assert_eq!(
            route.instructions,
            vec![
                "Head southwest on Swanston Street",
                "You have arrived at your 1st destination",
                "Turn left onto Flinders Lane",
            ]
        );
    }

    #[test]
    fn no_route_code_is_not_found() {
        let parsed: DirectionsResponse =
            serde_json::from_str(r#"{"code": "NoRoute", "message": "No route found"}"#).unwrap();
        assert!(matches!(
            parse_directions(parsed),
            Err(PathProviderError::NotFound)
        ));
    }

    #[test]
    fn empty_routes_is_not_found() {
        let parsed: DirectionsResponse =
            serde_json::from_str(r#"{"code": "Ok", "routes": []}"#).unwrap();
        assert!(matches!(
            parse_directions(parsed),
            Err(PathProviderError::NotFound)
        ));
    }

    #[test]
    fn unexpected_code_is_decode_error() {
        let parsed: DirectionsResponse =
            serde_json::from_str(r#"{"code": "InvalidInput", "message": "bad"}"#).unwrap();
        assert!(matches!(
            parse_directions(parsed),
            Err(PathProviderError::Decode(_))
        ));
    }

    #[test]
    fn unroutable_error_status_is_not_found() {
        let err = route_from_response(
            reqwest::StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code": "NoSegment", "message": "Could not find a matching segment"}"#.into(),
        )
        .unwrap_err();
        assert!(matches!(err, PathProviderError::NotFound));
    }

    #[test]
    fn other_error_status_keeps_status_and_body() {
        let err = route_from_response(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"message": "Not Authorized - Invalid Token"}"#.into(),
        )
        .unwrap_err();
        match err {
            PathProviderError::UpstreamStatus { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid Token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn success_status_parses_the_route() {
        let route = route_from_response(reqwest::StatusCode::OK, TWO_LEG_RESPONSE.into()).unwrap();
        assert_eq!(route.coordinates.len(), 3);
    }

    #[test]
    fn success_status_with_garbage_body_is_decode_error() {
        let err = route_from_response(reqwest::StatusCode::OK, "<html>".into()).unwrap_err();
        assert!(matches!(err, PathProviderError::Decode(_)));
    }

    #[test]
    fn directions_url_orders_lng_before_lat() {
        let url = provider(Some("key")).directions_url(
            &[
                Coordinate::new(-37.8136, 144.9631),
                Coordinate::new(-37.8150, 144.9650),
            ],
            TravelProfile::Cycling,
        );
        assert_eq!(
            url,
            "https://api.mapbox.test/directions/v5/mapbox/cycling/144.9631,-37.8136;144.965,-37.815"
        );
        assert!(!url.contains("key"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let provider = provider(None);
        assert!(!provider.is_configured());
        let err = provider
            .route(
                &[
                    Coordinate::new(-37.8136, 144.9631),
                    Coordinate::new(-37.8150, 144.9650),
                ],
                TravelProfile::Walking,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PathProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn single_coordinate_is_rejected() {
        let err = provider(Some("key"))
            .route(&[Coordinate::new(0.0, 0.0)], TravelProfile::Walking)
            .await
            .unwrap_err();
        assert!(matches!(err, PathProviderError::TooFewCoordinates(1)));
    }
}
