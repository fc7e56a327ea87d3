use serde_json::Value;

use crate::{
    datatypes::{Coord, SkinState, Zone},
    error::SkinError,
    projection::zone_for_cell,
    recompute::{apply_validated, ZoneEdit},
};

/// The skin properties edit form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditForm {
    pub is_open: bool,
    pub editing_zone: Option<String>,
    pub apply_thickness: bool,
    pub thickness: Option<f64>,
    pub density: Option<f64>,
}

impl EditForm {
    pub fn closed() -> EditForm {
        EditForm::default()
    }

    /// Opens the form for the zone owning the clicked cell, prefilled with the
    /// zone's current targets. Clicking a cell outside every zone keeps it closed
    pub fn open_for_cell(active_cell: Option<&Coord>, zones: &[Zone]) -> EditForm {
        let zone = match active_cell.and_then(|cell| zone_for_cell(zones, cell)) {
            Some(z) => z,
            None => return EditForm::closed(),
        };

        EditForm {
            is_open: true,
            editing_zone: Some(zone.name.clone()),
            apply_thickness: zone.target_thickness.is_some(),
            thickness: zone.target_thickness,
            density: zone.target_density,
        }
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Saves the form contents. On success the form closes and the new state
    /// is returned; on failure the form stays open and the error is returned
    ///
    /// # Arguments
    /// * `state` - The state the form was opened against
    /// * `density` - The density input as the user left it
    /// * `thickness` - The thickness input as the user left it
    pub fn save(
        &mut self,
        state: &SkinState,
        density: Value,
        thickness: Value,
    ) -> Result<SkinState, SkinError> {
        let zone_name = match &self.editing_zone {
            Some(name) => name.clone(),
            None => return Err(SkinError::ZoneNotFound(String::new())),
        };

        let edit = ZoneEdit::new(&zone_name, density, self.apply_thickness, thickness);
        let properties = edit.validate()?;
        let next = apply_validated(state, &zone_name, &properties)?;

        self.density = Some(properties.density);
        self.thickness = properties.thickness;
        self.close();
        Ok(next)
    }
}
