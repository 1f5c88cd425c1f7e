use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use shared::{
    ApiError, BoundsRequest, Coordinate, DangerousArea, ErrorKind, RiskLevel, RouteMetadata,
    RoutePayload, RouteRequest, RouteResponse, SafetyAnalysis, SafetyMetadata, TravelProfile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Hazardous,
    Protective,
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    UnlitStreet,
    DangerousArea,
    CrimeHotspot,
    PoorVisibility,
    UnsafeInfrastructure,
    SuspiciousActivity,
    WellLitSafe,
    PolicePresence,
    BusySafeArea,
    CctvMonitored,
    EmergencyPhone,
    #[serde(other)]
    Unknown,
}

impl IncidentCategory {
    pub const ALL: [IncidentCategory; 11] = [
        IncidentCategory::UnlitStreet,
        IncidentCategory::DangerousArea,
        IncidentCategory::CrimeHotspot,
        IncidentCategory::PoorVisibility,
        IncidentCategory::UnsafeInfrastructure,
        IncidentCategory::SuspiciousActivity,
        IncidentCategory::WellLitSafe,
        IncidentCategory::PolicePresence,
        IncidentCategory::BusySafeArea,
        IncidentCategory::CctvMonitored,
        IncidentCategory::EmergencyPhone,
    ];

    pub fn kind(self) -> CategoryKind {
        match self {
            IncidentCategory::UnlitStreet
            | IncidentCategory::DangerousArea
            | IncidentCategory::CrimeHotspot
            | IncidentCategory::PoorVisibility
            | IncidentCategory::UnsafeInfrastructure
            | IncidentCategory::SuspiciousActivity => CategoryKind::Hazardous,
            IncidentCategory::WellLitSafe
            | IncidentCategory::PolicePresence
            | IncidentCategory::BusySafeArea
            | IncidentCategory::CctvMonitored
            | IncidentCategory::EmergencyPhone => CategoryKind::Protective,
            IncidentCategory::Unknown => CategoryKind::Unclassified,
        }
    }

    pub fn is_hazardous(self) -> bool {
        self.kind() == CategoryKind::Hazardous
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentCategory::UnlitStreet => "unlit_street",
            IncidentCategory::DangerousArea => "dangerous_area",
            IncidentCategory::CrimeHotspot => "crime_hotspot",
            IncidentCategory::PoorVisibility => "poor_visibility",
            IncidentCategory::UnsafeInfrastructure => "unsafe_infrastructure",
            IncidentCategory::SuspiciousActivity => "suspicious_activity",
            IncidentCategory::WellLitSafe => "well_lit_safe",
            IncidentCategory::PolicePresence => "police_presence",
            IncidentCategory::BusySafeArea => "busy_safe_area",
            IncidentCategory::CctvMonitored => "cctv_monitored",
            IncidentCategory::EmergencyPhone => "emergency_phone",
            IncidentCategory::Unknown => "unknown",
        }
    }

    /// Parse a stored category; anything unrecognised becomes `Unknown`.
    pub fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .unwrap_or(IncidentCategory::Unknown)
    }

    /// Human-readable label, e.g. `crime hotspot`.
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

/// Score weight and exclusion radius attached to a severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityProfile {
    pub weight: u32,
    pub buffer_radius_km: f64,
}

impl Severity {
    pub const fn profile(self) -> SeverityProfile {
        match self {
            Severity::Low => SeverityProfile {
                weight: 10,
                buffer_radius_km: 0.10,
            },
            Severity::Medium => SeverityProfile {
                weight: 25,
                buffer_radius_km: 0.20,
            },
            Severity::High => SeverityProfile {
                weight: 40,
                buffer_radius_km: 0.30,
            },
            Severity::Critical => SeverityProfile {
                weight: 60,
                buffer_radius_km: 0.50,
            },
            Severity::Unknown => SeverityProfile {
                weight: 15,
                buffer_radius_km: 0.15,
            },
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unknown,
        }
    }
}

fn default_severity() -> Severity {
    Severity::Medium
}

/// A community-submitted safety observation, read-only to the routing core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub id: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub category: IncidentCategory,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub rating_avg: f64,
    #[serde(default)]
    pub rating_count: i64,
}

impl IncidentReport {
    pub fn location(&self) -> Coordinate {
        Coordinate {
            lat: self.location_lat,
            lng: self.location_lng,
        }
    }
}
