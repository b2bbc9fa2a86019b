//! Catalog of reference objects with known physical dimensions.
//!
//! Catalog JSON follows the `camdim.catalog.v1` schema: a flat list of
//! entries with millimeter dimensions and a manufacturing accuracy in
//! `[0, 1]`. A small builtin catalog of widely available objects is
//! compiled in and used whenever the caller does not load their own.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

const CATALOG_SCHEMA_V1: &str = "camdim.catalog.v1";

/// Problems loading or validating a catalog file. Distinct from
/// [`CalibrationError`](crate::CalibrationError): a malformed catalog is a
/// hard input error, not a rejected calibration.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unsupported catalog schema '{found}' (expected '{CATALOG_SCHEMA_V1}')")]
    SchemaMismatch { found: String },
    #[error("duplicate reference id '{0}'")]
    DuplicateId(String),
    #[error("reference '{id}' has non-positive dimensions {width_mm}x{height_mm} mm")]
    InvalidDimensions {
        id: String,
        width_mm: f64,
        height_mm: f64,
    },
    #[error("reference '{id}' has accuracy {accuracy} outside [0, 1]")]
    InvalidAccuracy { id: String, accuracy: f64 },
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One reference object with known real-world dimensions.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceEntry {
    pub id: String,
    pub name: String,
    pub width_mm: f64,
    pub height_mm: f64,
    /// How tightly manufactured the object is, `[0, 1]`. Feeds the
    /// calibration confidence.
    pub accuracy: f64,
}

impl ReferenceEntry {
    /// Orientation-free aspect ratio, always `>= 1`.
    pub fn aspect(&self) -> f64 {
        let long = self.width_mm.max(self.height_mm);
        let short = self.width_mm.min(self.height_mm);
        long / short
    }

    /// Longer physical side in mm.
    pub fn long_side_mm(&self) -> f64 {
        self.width_mm.max(self.height_mm)
    }

    /// Shorter physical side in mm.
    pub fn short_side_mm(&self) -> f64 {
        self.width_mm.min(self.height_mm)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogSpecV1 {
    schema: String,
    entries: Vec<ReferenceEntry>,
}

/// Validated reference catalog with an id lookup table.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    entries: Vec<ReferenceEntry>,
    id_to_idx: HashMap<String, usize>,
}

impl ReferenceCatalog {
    /// Build a catalog from caller-supplied entries.
    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Result<Self, CatalogError> {
        let mut id_to_idx = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if !(entry.width_mm > 0.0)
                || !(entry.height_mm > 0.0)
                || !entry.width_mm.is_finite()
                || !entry.height_mm.is_finite()
            {
                return Err(CatalogError::InvalidDimensions {
                    id: entry.id.clone(),
                    width_mm: entry.width_mm,
                    height_mm: entry.height_mm,
                });
            }
            if !(0.0..=1.0).contains(&entry.accuracy) {
                return Err(CatalogError::InvalidAccuracy {
                    id: entry.id.clone(),
                    accuracy: entry.accuracy,
                });
            }
            if id_to_idx.insert(entry.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries, id_to_idx })
    }

    /// Parse and validate catalog JSON.
    pub fn from_json(data: &str) -> Result<Self, CatalogError> {
        let spec: CatalogSpecV1 = serde_json::from_str(data)?;
        if spec.schema != CATALOG_SCHEMA_V1 {
            return Err(CatalogError::SchemaMismatch { found: spec.schema });
        }
        Self::from_entries(spec.entries)
    }

    /// Load a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Serialize back to schema-tagged JSON.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let spec = CatalogSpecV1 {
            schema: CATALOG_SCHEMA_V1.to_string(),
            entries: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&spec)?)
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&ReferenceEntry> {
        self.id_to_idx.get(id).map(|&idx| &self.entries[idx])
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry whose aspect ratio sits closest to `aspect`, as long as
    /// the relative deviation stays within `tolerance_pct` percent.
    /// Deviation ties resolve toward the more accurately manufactured
    /// entry. `aspect` is normalized to `>= 1` before matching, so the
    /// observed orientation does not matter.
    pub fn best_aspect_match(&self, aspect: f64, tolerance_pct: f64) -> Option<&ReferenceEntry> {
        if !(aspect > 0.0) || !aspect.is_finite() {
            return None;
        }
        let observed = if aspect < 1.0 { 1.0 / aspect } else { aspect };
        let mut best: Option<(&ReferenceEntry, f64)> = None;
        for entry in &self.entries {
            let deviation_pct = (entry.aspect() - observed).abs() / entry.aspect() * 100.0;
            if deviation_pct > tolerance_pct {
                continue;
            }
            let better = match best {
                None => true,
                Some((cur, cur_dev)) => {
                    deviation_pct < cur_dev
                        || (deviation_pct == cur_dev && entry.accuracy > cur.accuracy)
                }
            };
            if better {
                best = Some((entry, deviation_pct));
            }
        }
        best.map(|(entry, _)| entry)
    }
}

impl Default for ReferenceCatalog {
    /// Builtin references: an ISO/IEC 7810 ID-1 card, two common coins
    /// and an A4 sheet.
    fn default() -> Self {
        let entries = vec![
            ReferenceEntry {
                id: "id1-card".to_string(),
                name: "ID-1 payment card".to_string(),
                width_mm: 85.60,
                height_mm: 53.98,
                accuracy: 0.98,
            },
            ReferenceEntry {
                id: "us-quarter".to_string(),
                name: "US quarter dollar".to_string(),
                width_mm: 24.26,
                height_mm: 24.26,
                accuracy: 0.95,
            },
            ReferenceEntry {
                id: "eur-2".to_string(),
                name: "2 euro coin".to_string(),
                width_mm: 25.75,
                height_mm: 25.75,
                accuracy: 0.95,
            },
            ReferenceEntry {
                id: "a4-sheet".to_string(),
                name: "A4 paper sheet".to_string(),
                width_mm: 297.0,
                height_mm: 210.0,
                accuracy: 0.90,
            },
        ];
        Self::from_entries(entries).expect("builtin catalog must be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_the_id1_card() {
        let catalog = ReferenceCatalog::default();
        let card = catalog.get("id1-card").expect("builtin card");
        assert_eq!(card.width_mm, 85.60);
        assert_eq!(card.height_mm, 53.98);
        assert!((card.aspect() - 1.5858).abs() < 1e-3);
    }

    #[test]
    fn json_round_trip_preserves_entries() {
        let catalog = ReferenceCatalog::default();
        let json = catalog.to_json().expect("serialize");
        let back = ReferenceCatalog::from_json(&json).expect("parse");
        assert_eq!(back.entries(), catalog.entries());
        assert_eq!(back.get("eur-2"), catalog.get("eur-2"));
    }

    #[test]
    fn schema_tag_is_enforced() {
        let raw = r#"{"schema":"camdim.catalog.v2","entries":[]}"#;
        let err = ReferenceCatalog::from_json(raw).expect_err("schema mismatch");
        assert!(err.to_string().contains("camdim.catalog.v2"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{"schema":"camdim.catalog.v1","entries":[],"notes":"x"}"#;
        assert!(ReferenceCatalog::from_json(raw).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let entry = ReferenceEntry {
            id: "coin".to_string(),
            name: "coin".to_string(),
            width_mm: 20.0,
            height_mm: 20.0,
            accuracy: 0.9,
        };
        let err = ReferenceCatalog::from_entries(vec![entry.clone(), entry]).expect_err("dup");
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "coin"));
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let entry = ReferenceEntry {
            id: "bad".to_string(),
            name: "bad".to_string(),
            width_mm: 0.0,
            height_mm: 10.0,
            accuracy: 0.9,
        };
        assert!(ReferenceCatalog::from_entries(vec![entry]).is_err());
    }

    #[test]
    fn aspect_match_picks_the_card_for_card_like_boxes() {
        let catalog = ReferenceCatalog::default();
        let hit = catalog.best_aspect_match(1.59, 15.0).expect("match");
        assert_eq!(hit.id, "id1-card");
        // orientation must not matter
        let hit = catalog.best_aspect_match(1.0 / 1.59, 15.0).expect("match");
        assert_eq!(hit.id, "id1-card");
    }

    #[test]
    fn aspect_match_prefers_square_references_for_coins() {
        let catalog = ReferenceCatalog::default();
        let hit = catalog.best_aspect_match(1.02, 15.0).expect("match");
        // both coins tie at aspect 1; accuracy also ties, catalog order wins
        assert_eq!(hit.aspect(), 1.0);
    }

    #[test]
    fn aspect_match_fails_outside_tolerance() {
        let catalog = ReferenceCatalog::default();
        assert!(catalog.best_aspect_match(3.5, 10.0).is_none());
    }
}
