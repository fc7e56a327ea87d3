use serde::Deserialize;

use crate::{
    datatypes::{FRAME_CROSS_SECTION, FRAME_DENSITY, STRINGER_CROSS_SECTION, STRINGER_DENSITY},
    error::SkinError,
};

/// Display settings, optionally loaded from a json document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Decimal places used when formatting non-integral values
    pub decimal_places: usize,
    /// Skin table columns hidden from the display table
    pub hidden_skin_columns: Vec<String>,
    pub default_zone_color: String,
    pub default_text_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            decimal_places: 3,
            // older exports carry a trailing space on the frame cross section
            hidden_skin_columns: vec![
                FRAME_CROSS_SECTION.to_owned(),
                format!("{FRAME_CROSS_SECTION} "),
                FRAME_DENSITY.to_owned(),
                STRINGER_CROSS_SECTION.to_owned(),
                STRINGER_DENSITY.to_owned(),
            ],
            default_zone_color: "#d3d3d3".to_owned(),
            default_text_color: "black".to_owned(),
        }
    }
}

impl Settings {
    /// Loads settings from a json file. Missing keys keep their defaults
    pub fn load(settings_file: &str) -> Result<Settings, SkinError> {
        let contents = match std::fs::read_to_string(settings_file) {
            Ok(c) => c,
            Err(err) => {
                return Err(SkinError::Input(format!(
                    "Unable to open settings file {settings_file}: {err}"
                )))
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => {
                log::info!("loaded settings from {settings_file}");
                Ok(settings)
            }
            Err(err) => Err(SkinError::Input(format!(
                "Error in settings file json: {err}"
            ))),
        }
    }

    pub fn load_or_default(settings_file: Option<&str>) -> Result<Settings, SkinError> {
        match settings_file {
            Some(path) => Settings::load(path),
            None => Ok(Settings::default()),
        }
    }
}
