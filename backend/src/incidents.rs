use std::{fs::File, io::Read, path::Path};

use async_trait::async_trait;

use crate::{geometry::BoundingBox, models::IncidentReport};

#[derive(Debug, thiserror::Error)]
pub enum IncidentStoreError {
    #[error("failed to read incident file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid incident data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("incident database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("incident query timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Source of incident reports for a bounding box.
///
/// Implementations return every incident whose point lies inside the box,
/// unfiltered by category or severity.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn query_in_bounds(
        &self,
        bounds: &BoundingBox,
    ) -> Result<Vec<IncidentReport>, IncidentStoreError>;
}

/// Incident store backed by a list held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIncidentStore {
    incidents: Vec<IncidentReport>,
}

impl InMemoryIncidentStore {
    pub fn new(incidents: Vec<IncidentReport>) -> Self {
        Self { incidents }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IncidentStoreError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, IncidentStoreError> {
        let incidents: Vec<IncidentReport> = serde_json::from_reader(reader)?;
        Ok(Self::new(incidents))
    }

    pub fn incidents(&self) -> &[IncidentReport] {
        &self.incidents
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn query_in_bounds(
        &self,
        bounds: &BoundingBox,
    ) -> Result<Vec<IncidentReport>, IncidentStoreError> {
        Ok(self
            .incidents
            .iter()
            .filter(|incident| bounds.contains(incident.location()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::models::{Coordinate, IncidentCategory};

    const SAMPLE: &str = include_str!("../data/sample_incidents.json");

    fn melbourne_cbd() -> BoundingBox {
        BoundingBox::covering(
            Coordinate::new(-37.8200, 144.9550),
            Coordinate::new(-37.8100, 144.9700),
        )
    }

    #[tokio::test]
    async fn returns_only_incidents_inside_bounds() {
        let store = InMemoryIncidentStore::from_reader(SAMPLE.as_bytes()).expect("sample incidents");
        let found = store.query_in_bounds(&melbourne_cbd()).await.unwrap();

        assert!(!found.is_empty());
        assert!(found.len() < store.len());
        assert!(found.iter().all(|i| melbourne_cbd().contains(i.location())));
    }

    #[tokio::test]
    async fn does_not_filter_by_category() {
        let store = InMemoryIncidentStore::from_reader(SAMPLE.as_bytes()).unwrap();
        let found = store.query_in_bounds(&melbourne_cbd()).await.unwrap();

        assert!(found.iter().any(|i| i.category.is_hazardous()));
        assert!(found
            .iter()
            .any(|i| i.category == IncidentCategory::WellLitSafe));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let store = InMemoryIncidentStore::from_file(file.path()).unwrap();
        assert!(!store.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = InMemoryIncidentStore::from_reader("{not json".as_bytes()).unwrap_err();
        assert!(matches!(err, IncidentStoreError::Parse(_)));
    }
}
