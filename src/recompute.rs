use serde::Deserialize;
use serde_json::Value;

use crate::{
    datatypes::{Coord, SkinCellRecord, SkinState},
    error::SkinError,
};

pub const MM_TO_CM: f64 = 0.1;

/// A save request from the zone edit form, with the inputs as the form sent them
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneEdit {
    pub zone_name: String,
    #[serde(default)]
    pub density: Value,
    #[serde(default)]
    pub apply_thickness: bool,
    #[serde(default)]
    pub thickness: Value,
}

/// Validated target properties for a zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinProperties {
    pub density: f64,
    pub thickness: Option<f64>,
}

impl ZoneEdit {
    pub fn new(
        zone_name: &str,
        density: Value,
        apply_thickness: bool,
        thickness: Value,
    ) -> ZoneEdit {
        ZoneEdit {
            zone_name: zone_name.to_owned(),
            density,
            apply_thickness,
            thickness,
        }
    }

    /// Parses the numeric inputs. Thickness is only read when the checkbox is set
    pub fn validate(&self) -> Result<SkinProperties, SkinError> {
        let density = parse_numeric(&self.density, "target density")?;
        let thickness = if self.apply_thickness {
            Some(parse_numeric(&self.thickness, "target thickness")?)
        } else {
            None
        };

        Ok(SkinProperties { density, thickness })
    }
}

/// Reads a form value as a finite number
///
/// # Arguments
/// * `value` - A json number or a string holding one
/// * `field` - The field name used in error messages
pub fn parse_numeric(value: &Value, field: &str) -> Result<f64, SkinError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(SkinError::InvalidNumericInput(format!(
            "{field} must be a number, got {value}"
        ))),
    }
}

/// Computes the weight of one skin cell in grams
///
/// # Arguments
/// * `stringer_length_mm` - Stringer length of the cell
/// * `frame_length_mm` - Frame length (pitch) of the cell
/// * `thickness_mm` - Skin thickness
/// * `density` - Skin density in g/cm³
pub fn skin_weight(
    stringer_length_mm: f64,
    frame_length_mm: f64,
    thickness_mm: f64,
    density: f64,
) -> f64 {
    (stringer_length_mm * MM_TO_CM)
        * (frame_length_mm * MM_TO_CM)
        * (thickness_mm * MM_TO_CM)
        * density
}

/// Sets the density (and optionally the thickness) of one skin record and
/// recomputes its weight. Returns the new weight. A weight that does not fit
/// in a finite float is rejected before the record is touched
fn update_record(
    record: &mut SkinCellRecord,
    properties: &SkinProperties,
) -> Result<f64, SkinError> {
    let thickness = match properties.thickness {
        Some(t) => Some(t),
        None => record.skin_thickness,
    };

    let weight = skin_weight(
        record.stringer_length.unwrap_or(0.0),
        record.frame_length.unwrap_or(0.0),
        thickness.unwrap_or(0.0),
        properties.density,
    );
    if !weight.is_finite() {
        return Err(SkinError::InvalidNumericInput(format!(
            "density {} gives a non-finite weight for cell ({}, {})",
            properties.density, record.row, record.column
        )));
    }

    record.skin_density = Some(properties.density);
    record.skin_thickness = thickness;
    record.weight = Some(weight);

    Ok(weight)
}

/// Applies new target properties to every cell of a zone
///
/// The input state is never touched. Inputs are validated first and the
/// returned state is a modified copy, so any error leaves the caller with
/// the state it passed in.
///
/// # Arguments
/// * `state` - The current raw table, skin table and zones
/// * `edit` - The save request from the edit form
///
/// # Returns
/// The recomputed state
pub fn apply_zone_properties(state: &SkinState, edit: &ZoneEdit) -> Result<SkinState, SkinError> {
    let properties = edit.validate()?;
    apply_validated(state, &edit.zone_name, &properties)
}

/// Applies already validated properties to a zone. See `apply_zone_properties`
pub fn apply_validated(
    state: &SkinState,
    zone_name: &str,
    properties: &SkinProperties,
) -> Result<SkinState, SkinError> {
    if state.raw.is_empty() {
        return Err(SkinError::MissingTable("raw table is empty".to_owned()));
    }
    if state.skin.is_empty() {
        return Err(SkinError::MissingTable("skin table is empty".to_owned()));
    }

    let zone_idx = match state.zones.iter().position(|z| z.name == zone_name) {
        Some(i) => i,
        None => return Err(SkinError::ZoneNotFound(zone_name.to_owned())),
    };

    let mut next = state.clone();
    let stringer_pitches = next.raw.stringer_pitches();
    let zone = &mut next.zones[zone_idx];

    zone.target_density = Some(properties.density);
    zone.target_thickness = properties.thickness;

    let coords: Vec<Coord> = zone.coords.clone();
    let mut updated_cells = 0;

    for coord in &coords {
        let stringer_pitch = match stringer_pitches.get(coord.row) {
            Some(p) => *p,
            None => {
                log::warn!(
                    "zone {} references stringer row {} but the raw table has {} rows",
                    zone_name,
                    coord.row,
                    stringer_pitches.len()
                );
                continue;
            }
        };

        let mut cell_weight: Option<f64> = None;
        for record in next.skin.rows.iter_mut() {
            if record.zone_name == zone_name
                && record.row == stringer_pitch
                && record.column == coord.column_id
            {
                cell_weight = Some(update_record(record, properties)?);
            }
        }

        if let Some(weight) = cell_weight {
            log::debug!("zone {} cell {} -> {:.3} g", zone_name, coord.key(), weight);
            next.zones[zone_idx].weight.insert(coord.key(), weight);
            updated_cells += 1;
        }
    }

    log::info!(
        "applied density {} to {} of {} cells in zone {}",
        properties.density,
        updated_cells,
        coords.len(),
        zone_name
    );

    Ok(next)
}
