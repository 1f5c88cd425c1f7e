use crate::models::{CategoryKind, Coordinate, IncidentCategory, IncidentReport, Severity};

/// Circular exclusion region derived from a hazardous incident.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferZone {
    pub center: Coordinate,
    pub radius_km: f64,
    pub severity: Severity,
    pub category: IncidentCategory,
}

pub fn severity_weight(severity: Severity) -> u32 {
    severity.profile().weight
}

/// Exclusion radius in kilometers. Zero for anything that is not hazardous.
pub fn buffer_radius(category: IncidentCategory, severity: Severity) -> f64 {
    match category.kind() {
        CategoryKind::Hazardous => severity.profile().buffer_radius_km,
        CategoryKind::Protective | CategoryKind::Unclassified => 0.0,
    }
}

/// One zone per hazardous incident. Overlapping incidents are kept as
/// overlapping zones.
pub fn build_zones(incidents: &[IncidentReport]) -> Vec<BufferZone> {
    let zones: Vec<BufferZone> = incidents
        .iter()
        .filter_map(|incident| {
            let radius_km = buffer_radius(incident.category, incident.severity);
            (radius_km > 0.0).then(|| BufferZone {
                center: incident.location(),
                radius_km,
                severity: incident.severity,
                category: incident.category,
            })
        })
        .collect();

    tracing::debug!(
        "built {} buffer zone(s) from {} incident(s)",
        zones.len(),
        incidents.len()
    );
    zones
}
