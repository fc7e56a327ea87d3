use indicatif::ProgressBar;

use crate::{
    datatypes::SkinState,
    error::SkinError,
    recompute::{apply_zone_properties, ZoneEdit},
};

/// An edit from a batch that could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEdit {
    pub position: usize,
    pub zone_name: String,
    pub error: SkinError,
}

/// Reads an ordered list of zone edits from a json file
pub fn load_edits(edits_file: &str) -> Result<Vec<ZoneEdit>, SkinError> {
    let contents = match std::fs::read_to_string(edits_file) {
        Ok(c) => c,
        Err(err) => {
            return Err(SkinError::Input(format!(
                "Unable to open edits file {edits_file}: {err}"
            )))
        }
    };

    match serde_json::from_str(&contents) {
        Ok(edits) => Ok(edits),
        Err(err) => Err(SkinError::Input(format!(
            "Error in edits file json: {err}"
        ))),
    }
}

/// Applies edits in order, feeding each result into the next edit
///
/// A rejected edit leaves the state as it was before that edit and the batch
/// carries on.
///
/// # Arguments
/// * `state` - The starting state
/// * `edits` - The edits to apply, in order
///
/// # Returns
/// The final state and the edits that were rejected
pub fn apply_batch(state: &SkinState, edits: &[ZoneEdit]) -> (SkinState, Vec<RejectedEdit>) {
    let mut current = state.clone();
    let mut rejected: Vec<RejectedEdit> = Vec::new();

    let bar = ProgressBar::new(edits.len() as u64);
    for (position, edit) in edits.iter().enumerate() {
        match apply_zone_properties(&current, edit) {
            Ok(next) => current = next,
            Err(error) => {
                log::warn!("skipping edit {} for zone {}: {}", position, edit.zone_name, error);
                rejected.push(RejectedEdit {
                    position,
                    zone_name: edit.zone_name.clone(),
                    error,
                });
            }
        }
        bar.inc(1);
    }
    bar.finish_with_message(format!(
        "applied {} of {} edits",
        edits.len() - rejected.len(),
        edits.len()
    ));

    (current, rejected)
}
