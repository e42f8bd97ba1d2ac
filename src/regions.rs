//! Geographic regions used for event classification and alert filtering.
//!
//! The catalog is a static table of named bounding boxes. Containment is
//! inclusive on all four edges, and regions may overlap: a point can carry
//! several region tags at once. The pseudo-region "all" is represented by
//! [`RegionFilter::All`] and is never tested geometrically.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---

/// Identifier of a configured geographic region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionId {
    Myanmar,
    Thailand,
    China,
    India,
    Bangladesh,
    Laos,
}

impl RegionId {
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            RegionId::Myanmar => "myanmar",
            RegionId::Thailand => "thailand",
            RegionId::China => "china",
            RegionId::India => "india",
            RegionId::Bangladesh => "bangladesh",
            RegionId::Laos => "laos",
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s {
            "myanmar" => Ok(RegionId::Myanmar),
            "thailand" => Ok(RegionId::Thailand),
            "china" => Ok(RegionId::China),
            "india" => Ok(RegionId::India),
            "bangladesh" => Ok(RegionId::Bangladesh),
            "laos" => Ok(RegionId::Laos),
            other => Err(format!("unknown region `{other}`")),
        }
    }
}

// ---

/// Degree-space bounding box, WGS84. Containment is inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        // ---
        latitude <= self.north
            && latitude >= self.south
            && longitude <= self.east
            && longitude >= self.west
    }
}

/// A named region with its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionDefinition {
    pub id: RegionId,
    pub bounds: BoundingBox,
}

// ---

/// Static table of configured regions with point-in-region queries.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<RegionDefinition>,
}

impl Default for RegionCatalog {
    /// The monitored countries around the Myanmar area of interest.
    fn default() -> Self {
        // ---
        Self::with_regions(vec![
            RegionDefinition {
                id: RegionId::Myanmar,
                bounds: BoundingBox {
                    north: 28.5,
                    south: 9.5,
                    east: 101.0,
                    west: 92.0,
                },
            },
            RegionDefinition {
                id: RegionId::Thailand,
                bounds: BoundingBox {
                    north: 20.5,
                    south: 5.5,
                    east: 106.0,
                    west: 97.0,
                },
            },
            RegionDefinition {
                id: RegionId::China,
                bounds: BoundingBox {
                    north: 53.5,
                    south: 15.0,
                    east: 135.0,
                    west: 73.0,
                },
            },
            RegionDefinition {
                id: RegionId::India,
                bounds: BoundingBox {
                    north: 37.0,
                    south: 6.0,
                    east: 97.5,
                    west: 68.0,
                },
            },
            RegionDefinition {
                id: RegionId::Bangladesh,
                bounds: BoundingBox {
                    north: 26.6,
                    south: 20.5,
                    east: 92.7,
                    west: 88.0,
                },
            },
            RegionDefinition {
                id: RegionId::Laos,
                bounds: BoundingBox {
                    north: 22.5,
                    south: 13.9,
                    east: 107.8,
                    west: 100.0,
                },
            },
        ])
    }
}

impl RegionCatalog {
    pub fn with_regions(regions: Vec<RegionDefinition>) -> Self {
        Self { regions }
    }

    pub fn definitions(&self) -> &[RegionDefinition] {
        &self.regions
    }

    /// All regions whose bounding box contains the point. An empty set is a
    /// valid answer (the event is in no named region); multiple tags mean
    /// overlapping regions, not an error.
    pub fn regions_containing(&self, latitude: f64, longitude: f64) -> BTreeSet<RegionId> {
        // ---
        self.regions
            .iter()
            .filter(|region| region.bounds.contains(latitude, longitude))
            .map(|region| region.id)
            .collect()
    }

    /// Single-region refinement of [`Self::regions_containing`].
    pub fn contains(&self, region: RegionId, latitude: f64, longitude: f64) -> bool {
        // ---
        self.regions
            .iter()
            .find(|definition| definition.id == region)
            .is_some_and(|definition| definition.bounds.contains(latitude, longitude))
    }
}

// ---

/// Alert-policy region scope: either one configured region or everything.
///
/// Serialized as a plain string (`"all"`, `"myanmar"`, ...) to match the
/// persisted preference format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionFilter {
    All,
    Within(RegionId),
}

impl RegionFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionFilter::All => "all",
            RegionFilter::Within(region) => region.as_str(),
        }
    }

    /// Whether an event carrying `tags` passes this filter. `All` matches
    /// unconditionally, without any geometric test.
    pub fn matches(&self, tags: &BTreeSet<RegionId>) -> bool {
        // ---
        match self {
            RegionFilter::All => true,
            RegionFilter::Within(region) => tags.contains(region),
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        if s == "all" {
            return Ok(RegionFilter::All);
        }
        s.parse::<RegionId>()
            .map(RegionFilter::Within)
            .map_err(|_| format!("unknown region filter `{s}` (expected `all` or a region id)"))
    }
}

impl Serialize for RegionFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegionFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // ---
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
