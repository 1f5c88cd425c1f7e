use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    error::RouteError,
    geometry::{bounding_box, BoundingBox},
    incidents::{IncidentStore, IncidentStoreError},
    models::{
        Coordinate, IncidentReport, RouteMetadata, RoutePayload, RouteResponse, SafetyAnalysis,
        TravelProfile,
    },
    planner::{self, Waypoint},
    provider::{PathProvider, PathProviderError, ProviderRoute},
    scoring, zones,
};

const PLANNING_BUFFER_BASE_DEG: f64 = 0.01;
/// ~1 km around the returned geometry for final scoring.
pub const SCORING_QUERY_BUFFER_DEG: f64 = 0.01;

/// Search region covering both endpoints, padded by half the larger span
/// plus a constant so short trips still see nearby zones.
pub fn search_region(origin: Coordinate, destination: Coordinate) -> BoundingBox {
    let bbox = BoundingBox::covering(origin, destination);
    let buffer = bbox.lat_span().max(bbox.lng_span()) * 0.5 + PLANNING_BUFFER_BASE_DEG;
    bbox.expanded(buffer)
}

/// Outcome of one route request before it is shaped for the wire.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    pub coordinates: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub instructions: Vec<String>,
    pub safety_analysis: SafetyAnalysis,
    pub waypoints: Vec<Waypoint>,
    pub used_safe_routing: bool,
    pub profile: TravelProfile,
}

impl PlannedRoute {
    pub fn into_response(self) -> RouteResponse {
        let waypoints_used = self.waypoints.len();
        let message = (self.used_safe_routing && waypoints_used > 0)
            .then(|| format!("Safe route found with {waypoints_used} waypoint(s)"));

        RouteResponse {
            route: RoutePayload {
                coordinates: self.coordinates.iter().map(|c| c.to_lng_lat()).collect(),
                distance_m: self.distance_m,
                duration_s: self.duration_s,
                instructions: self.instructions,
                safety_analysis: Some(self.safety_analysis),
            },
            waypoints_used,
            waypoints: self.waypoints.iter().map(|w| w.to_lng_lat()).collect(),
            message,
            metadata: RouteMetadata {
                profile: self.profile,
                used_safe_routing: self.used_safe_routing,
                waypoints_generated: waypoints_used,
            },
        }
    }
}

/// Stateless pipeline: search region, incidents, zones, waypoints, path,
/// then scoring of the returned path.
pub struct RouteOrchestrator {
    incidents: Arc<dyn IncidentStore>,
    paths: Arc<dyn PathProvider>,
    upstream_timeout: Duration,
}

impl RouteOrchestrator {
    pub fn new(
        incidents: Arc<dyn IncidentStore>,
        paths: Arc<dyn PathProvider>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            incidents,
            paths,
            upstream_timeout,
        }
    }

    pub async fn plan_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        use_safe_routing: bool,
        profile: TravelProfile,
    ) -> Result<PlannedRoute, RouteError> {
        validate_endpoint("origin", origin)?;
        validate_endpoint("destination", destination)?;

        tracing::info!(
            "route request {:?} -> {:?} (safe routing: {use_safe_routing}, profile: {})",
            origin,
            destination,
            profile.as_str()
        );

        let waypoints = if use_safe_routing {
            let region = search_region(origin, destination);
            let incidents = self.incidents_or_empty(&region, "planning").await;
            let zones = zones::build_zones(&incidents);
            planner::plan(origin, destination, &zones)
        } else {
            Vec::new()
        };

        let mut coordinates = Vec::with_capacity(waypoints.len() + 2);
        coordinates.push(origin);
        coordinates.extend(waypoints.iter().map(|w| w.coordinate));
        coordinates.push(destination);

        let route = self.request_path(&coordinates, profile).await?;
        tracing::info!(
            "path provider returned {} point(s), {:.0} m, {:.0} s",
            route.coordinates.len(),
            route.distance_m,
            route.duration_s
        );

        let scoring_region = bounding_box(&route.coordinates)
            .unwrap_or_else(|| BoundingBox::covering(origin, destination))
            .expanded(SCORING_QUERY_BUFFER_DEG);
        let nearby = self.incidents_or_empty(&scoring_region, "scoring").await;
        let safety_analysis = scoring::score(&route.coordinates, &nearby);

        tracing::info!(
            "route risk {:.1} ({:?}) with {} waypoint(s)",
            safety_analysis.risk_score,
            safety_analysis.risk_level,
            waypoints.len()
        );

        Ok(PlannedRoute {
            coordinates: route.coordinates,
            distance_m: route.distance_m,
            duration_s: route.duration_s,
            instructions: route.instructions,
            safety_analysis,
            waypoints,
            used_safe_routing: use_safe_routing,
            profile,
        })
    }

    /// Incident query bounded by the upstream timeout.
    pub async fn query_incidents(
        &self,
        bounds: &BoundingBox,
    ) -> Result<Vec<IncidentReport>, IncidentStoreError> {
        with_timeout(self.upstream_timeout, self.incidents.query_in_bounds(bounds))
            .await
            .unwrap_or(Err(IncidentStoreError::Timeout(self.upstream_timeout)))
    }

    async fn incidents_or_empty(&self, bounds: &BoundingBox, stage: &str) -> Vec<IncidentReport> {
        match self.query_incidents(bounds).await {
            Ok(incidents) => {
                tracing::debug!("{stage}: {} incident(s) in {:?}", incidents.len(), bounds);
                incidents
            }
            Err(err) => {
                tracing::warn!(
                    "{stage}: incident store unavailable, continuing without safety data: {err}"
                );
                Vec::new()
            }
        }
    }

    async fn request_path(
        &self,
        coordinates: &[Coordinate],
        profile: TravelProfile,
    ) -> Result<ProviderRoute, RouteError> {
        let result = with_timeout(self.upstream_timeout, self.paths.route(coordinates, profile))
            .await
            .unwrap_or(Err(PathProviderError::Timeout(self.upstream_timeout)));

        result.map_err(|err| {
            match &err {
                PathProviderError::NotFound => {
                    tracing::warn!("no path for {} coordinate(s)", coordinates.len())
                }
                other => tracing::error!("path provider failed: {other}"),
            }
            RouteError::from(err)
        })
    }
}

/// `None` when the deadline passes first.
async fn with_timeout<T>(limit: Duration, fut: impl Future<Output = T>) -> Option<T> {
    tokio::time::timeout(limit, fut).await.ok()
}

fn validate_endpoint(name: &str, coord: Coordinate) -> Result<(), RouteError> {
    if coord.is_valid() {
        Ok(())
    } else {
        Err(RouteError::InvalidInput(format!(
            "invalid {name} coordinates: lat={}, lng={}",
            coord.lat, coord.lng
        )))
    }
}
