use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    pub fn midpoint(self, other: Self) -> Self {
        self.interpolate(other, 0.5)
    }

    /// GeoJSON ordering: `[lng, lat]`.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lng: pair[0],
            lat: pair[1],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelProfile {
    #[default]
    Walking,
    Driving,
    Cycling,
}

impl TravelProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelProfile::Walking => "walking",
            TravelProfile::Driving => "driving",
            TravelProfile::Cycling => "cycling",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    #[serde(default)]
    pub use_safe_routing: bool,
    #[serde(default)]
    pub profile: TravelProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerousArea {
    pub lat: f64,
    pub lng: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyMetadata {
    pub analysis_buffer_km: f64,
    pub reports_analyzed: usize,
    pub dangerous_areas_count: usize,
    pub safety_features_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnalysis {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub safety_notes: Vec<String>,
    pub dangerous_areas: Vec<DangerousArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SafetyMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePayload {
    /// `[lng, lat]` pairs as returned by the path provider.
    pub coordinates: Vec<[f64; 2]>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub instructions: Vec<String>,
    #[serde(rename = "safetyAnalysis")]
    pub safety_analysis: Option<SafetyAnalysis>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetadata {
    pub profile: TravelProfile,
    pub used_safe_routing: bool,
    pub waypoints_generated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub route: RoutePayload,
    pub waypoints_used: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waypoints: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub metadata: RouteMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    RouteNotFound,
    UpstreamUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

/// South-west / north-east corners of an incident query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundsRequest {
    pub sw_lat: Option<f64>,
    pub sw_lng: Option<f64>,
    pub ne_lat: Option<f64>,
    pub ne_lng: Option<f64>,
}
