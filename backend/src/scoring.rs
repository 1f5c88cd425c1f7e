//! Route risk scoring against nearby incident reports.
//!
//! Every incident within [`PROXIMITY_THRESHOLD_DEG`] of the route contributes
//! an impact of `severity_weight * max(0.1, 1 - d / threshold)`. Hazardous
//! incidents add their impact, protective ones subtract half of it. The sum
//! is clamped to `[0, 100]` and bucketed into a [`RiskLevel`].
//!
//! An empty or entirely out-of-range incident set yields a fixed neutral
//! result (score 30, low) rather than a zero score.

use std::cmp::Ordering;

use crate::{
    geometry::{min_distance_to_polyline, KM_PER_DEGREE},
    models::{
        CategoryKind, Coordinate, DangerousArea, IncidentReport, RiskLevel, SafetyAnalysis,
        SafetyMetadata, Severity,
    },
    zones::severity_weight,
};

/// ~500 m in planar degrees.
pub const PROXIMITY_THRESHOLD_DEG: f64 = 0.005;
const DECAY_FLOOR: f64 = 0.1;
const PROTECTIVE_FACTOR: f64 = 0.5;
const MAX_SAFETY_NOTES: usize = 3;
const MAX_DANGEROUS_AREAS: usize = 5;

pub const NEUTRAL_RISK_SCORE: f64 = 30.0;
pub const DEFAULT_RISK_SCORE: f64 = 50.0;
pub const NO_DATA_NOTE: &str = "No safety reports found in this area";
pub const DEGRADED_NOTE: &str = "Unable to analyze route safety - using default risk level";

pub fn risk_level(score: f64) -> RiskLevel {
    if score >= 75.0 {
        RiskLevel::Critical
    } else if score >= 50.0 {
        RiskLevel::High
    } else if score >= 25.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Impact magnitude of an incident `distance_deg` away from the route.
pub fn impact(severity: Severity, distance_deg: f64) -> f64 {
    let decay = (1.0 - distance_deg / PROXIMITY_THRESHOLD_DEG).max(DECAY_FLOOR);
    f64::from(severity_weight(severity)) * decay
}

fn analysis_buffer_km() -> f64 {
    PROXIMITY_THRESHOLD_DEG * KM_PER_DEGREE
}

pub fn neutral_analysis() -> SafetyAnalysis {
    SafetyAnalysis {
        risk_score: NEUTRAL_RISK_SCORE,
        risk_level: RiskLevel::Low,
        safety_notes: vec![NO_DATA_NOTE.to_string()],
        dangerous_areas: Vec::new(),
        metadata: Some(SafetyMetadata {
            analysis_buffer_km: analysis_buffer_km(),
            reports_analyzed: 0,
            dangerous_areas_count: 0,
            safety_features_count: 0,
        }),
    }
}

/// Fixed medium-risk result used when scoring cannot be trusted.
pub fn degraded_analysis() -> SafetyAnalysis {
    SafetyAnalysis {
        risk_score: DEFAULT_RISK_SCORE,
        risk_level: RiskLevel::Medium,
        safety_notes: vec![DEGRADED_NOTE.to_string()],
        dangerous_areas: Vec::new(),
        metadata: None,
    }
}

struct Contribution<'a> {
    incident: &'a IncidentReport,
    kind: CategoryKind,
    impact: f64,
}

pub fn score(route: &[Coordinate], incidents: &[IncidentReport]) -> SafetyAnalysis {
    if incidents.is_empty() {
        return neutral_analysis();
    }

    if route
        .iter()
        .any(|c| !c.lat.is_finite() || !c.lng.is_finite())
    {
        tracing::warn!(
            "route geometry contains non-finite coordinates, falling back to default risk"
        );
        return degraded_analysis();
    }

    let mut contributions: Vec<Contribution> = incidents
        .iter()
        .filter_map(|incident| {
            let kind = incident.category.kind();
            if kind == CategoryKind::Unclassified {
                return None;
            }
            let distance = min_distance_to_polyline(incident.location(), route);
            if distance > PROXIMITY_THRESHOLD_DEG || distance.is_nan() {
                return None;
            }
            Some(Contribution {
                incident,
                kind,
                impact: impact(incident.severity, distance),
            })
        })
        .collect();

    if contributions.is_empty() {
        return neutral_analysis();
    }

    contributions.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(Ordering::Equal));

    let mut raw_score = 0.0;
    let mut safety_notes = Vec::new();
    let mut dangerous_areas = Vec::new();

    for contribution in &contributions {
        let incident = contribution.incident;
        match contribution.kind {
            CategoryKind::Hazardous => {
                raw_score += contribution.impact;
                dangerous_areas.push(DangerousArea {
                    lat: incident.location_lat,
                    lng: incident.location_lng,
                    reason: format!("{}: {}", incident.category.label(), incident.title),
                });
            }
            CategoryKind::Protective => {
                raw_score -= contribution.impact * PROTECTIVE_FACTOR;
                safety_notes.push(format!("Safe area: {}", incident.title));
            }
            CategoryKind::Unclassified => {}
        }
    }

    if !raw_score.is_finite() {
        tracing::warn!("risk score is not finite, falling back to default risk");
        return degraded_analysis();
    }

    let risk_score = raw_score.clamp(0.0, 100.0);
    let metadata = SafetyMetadata {
        analysis_buffer_km: analysis_buffer_km(),
        reports_analyzed: contributions.len(),
        dangerous_areas_count: dangerous_areas.len(),
        safety_features_count: safety_notes.len(),
    };

    safety_notes.truncate(MAX_SAFETY_NOTES);
    dangerous_areas.truncate(MAX_DANGEROUS_AREAS);

    tracing::debug!(
        "scored route: raw={raw_score:.2} clamped={risk_score:.2} from {} nearby report(s)",
        contributions.len()
    );

    SafetyAnalysis {
        risk_score,
        risk_level: risk_level(risk_score),
        safety_notes,
        dangerous_areas,
        metadata: Some(metadata),
    }
}
