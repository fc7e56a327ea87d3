use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STRINGER_PITCH: &str = "Stringer Pitch (mm)";
pub const FRAME_PITCH: &str = "Frame Pitch (ID)";
pub const STRINGER_LENGTH: &str = "Stringer Length (mm)";
pub const FRAME_LENGTH: &str = "Frame Length(Pitch) (mm)";
pub const STRINGER_CROSS_SECTION: &str = "Stringer Cross Section (mm²)";
pub const STRINGER_DENSITY: &str = "Stringer Density (g/cm³)";
pub const FRAME_CROSS_SECTION: &str = "Frame Cross Section";
pub const FRAME_DENSITY: &str = "Frame Density (g/cm³)";
pub const SKIN_THICKNESS: &str = "Skin Thickness (mm)";

pub const ZONE_NAME: &str = "Zone Name";
pub const ROW: &str = "Row";
pub const COLUMN: &str = "Column";
pub const SKIN_DENSITY: &str = "Skin Density (g/cm³)";
pub const WEIGHT: &str = "Weight (g)";

pub const TOTAL_WEIGHT_KG: &str = "Total Skin Weight (kg)";

/// One row of the physical grid, keyed by stringer pitch and frame pitch
#[derive(Debug, Clone, PartialEq)]
pub struct RawCellRecord {
    pub stringer_pitch: f64,
    pub frame_pitch: String,
    pub stringer_length: Option<f64>,
    pub frame_length: Option<f64>,
    pub stringer_cross_section: Option<f64>,
    pub stringer_density: Option<f64>,
    pub frame_cross_section: Option<f64>,
    pub frame_density: Option<f64>,
    pub skin_thickness: Option<f64>,
    /// Columns this record does not model, carried through untouched
    pub extra: BTreeMap<String, Value>,
}

/// One zone-assigned cell of the skin table
#[derive(Debug, Clone, PartialEq)]
pub struct SkinCellRecord {
    pub zone_name: String,
    /// Stringer pitch value (not the ordinal position)
    pub row: f64,
    /// Frame pitch identifier
    pub column: String,
    pub skin_density: Option<f64>,
    pub skin_thickness: Option<f64>,
    pub weight: Option<f64>,
    pub stringer_length: Option<f64>,
    pub frame_length: Option<f64>,
    pub extra: BTreeMap<String, Value>,
}

/// A rectangular table that remembers its column order and pandas-style index
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    pub columns: Vec<String>,
    pub index: Vec<Value>,
    pub rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Table {
            columns: Vec::new(),
            index: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl<R> Table<R> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

pub type RawTable = Table<RawCellRecord>;
pub type SkinTable = Table<SkinCellRecord>;

impl RawTable {
    /// Distinct stringer pitch values in first-seen order
    pub fn stringer_pitches(&self) -> Vec<f64> {
        let mut pitches: Vec<f64> = Vec::new();
        for record in &self.rows {
            if !pitches.contains(&record.stringer_pitch) {
                pitches.push(record.stringer_pitch);
            }
        }
        pitches
    }

    /// Distinct frame pitch identifiers in first-seen order
    pub fn frame_pitches(&self) -> Vec<String> {
        let mut frames: Vec<String> = Vec::new();
        for record in &self.rows {
            if !frames.contains(&record.frame_pitch) {
                frames.push(record.frame_pitch.clone());
            }
        }
        frames
    }
}

/// A grid cell referenced by a zone: ordinal stringer row and frame id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub column_id: String,
}

impl Coord {
    pub fn new(row: usize, column_id: &str) -> Coord {
        Coord {
            row,
            column_id: column_id.to_owned(),
        }
    }

    /// Key used by the zone's weight cache
    pub fn key(&self) -> String {
        format!("{}-{}", self.row, self.column_id)
    }
}

/// A named group of grid cells sharing one skin configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub coords: Vec<Coord>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub target_density: Option<f64>,
    #[serde(default)]
    pub target_thickness: Option<f64>,
    #[serde(default)]
    pub weight: BTreeMap<String, f64>,
    /// Fields owned by the drawing tools, passed through on save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Zone {
    #[cfg(test)]
    pub fn new(name: &str, coords: Vec<Coord>) -> Zone {
        Zone {
            name: name.to_owned(),
            coords,
            color: None,
            text_color: None,
            target_density: None,
            target_thickness: None,
            weight: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn contains(&self, coord: &Coord) -> bool {
        self.coords.contains(coord)
    }
}

/// Everything one edit cycle reads and produces
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinState {
    pub raw: RawTable,
    pub skin: SkinTable,
    pub zones: Vec<Zone>,
}
