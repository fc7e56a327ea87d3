use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Map, Number, Value};

use crate::{
    datatypes::{
        RawCellRecord, SkinCellRecord, SkinState, Table, Zone, COLUMN, FRAME_CROSS_SECTION,
        FRAME_DENSITY, FRAME_LENGTH, FRAME_PITCH, ROW, SKIN_DENSITY, SKIN_THICKNESS,
        STRINGER_CROSS_SECTION, STRINGER_DENSITY, STRINGER_LENGTH, STRINGER_PITCH, WEIGHT,
        ZONE_NAME,
    },
    error::SkinError,
};

pub const MAIN_DATA_KEY: &str = "main_data";
pub const SKIN_DATA_KEY: &str = "skin_data";
pub const PANELS_KEY: &str = "panels";

/// A borrowed view over one row of a split-orient table
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
    position: usize,
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Reads an optional numeric cell. Nulls, blank strings and non-finite
    /// values read as `None`
    pub fn number(&self, column: &str) -> Option<f64> {
        let parsed = match self.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    pub fn required_number(&self, column: &str) -> Result<f64, SkinError> {
        match self.number(column) {
            Some(n) => Ok(n),
            _ => Err(SkinError::MissingTable(format!(
                "row {} has no numeric value for '{column}'",
                self.position
            ))),
        }
    }

    /// Reads an identifier cell, accepting either text or a number
    pub fn required_id(&self, column: &str) -> Result<String, SkinError> {
        match self.get(column) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(number_to_id(n)),
            _ => Err(SkinError::MissingTable(format!(
                "row {} has no identifier for '{column}'",
                self.position
            ))),
        }
    }

    /// Collects every cell whose column is not in `known`
    pub fn extra(&self, known: &[&str]) -> BTreeMap<String, Value> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .filter(|(c, _)| !known.contains(&c.as_str()))
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect()
    }
}

fn number_to_id(n: &Number) -> String {
    match n.as_i64() {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

/// Converts an optional float into a JSON cell, writing non-finite values as null
pub fn number_value(value: Option<f64>) -> Value {
    value
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// A record type that can be read from and written to a split-orient table
pub trait TableRecord: Sized {
    /// Columns the record models directly
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row) -> Result<Self, SkinError>;

    fn value(&self, column: &str) -> Value;
}

impl TableRecord for RawCellRecord {
    const COLUMNS: &'static [&'static str] = &[
        STRINGER_PITCH,
        FRAME_PITCH,
        STRINGER_LENGTH,
        FRAME_LENGTH,
        STRINGER_CROSS_SECTION,
        STRINGER_DENSITY,
        FRAME_CROSS_SECTION,
        FRAME_DENSITY,
        SKIN_THICKNESS,
    ];

    fn from_row(row: &Row) -> Result<Self, SkinError> {
        Ok(RawCellRecord {
            stringer_pitch: row.required_number(STRINGER_PITCH)?,
            frame_pitch: row.required_id(FRAME_PITCH)?,
            stringer_length: row.number(STRINGER_LENGTH),
            frame_length: row.number(FRAME_LENGTH),
            stringer_cross_section: row.number(STRINGER_CROSS_SECTION),
            stringer_density: row.number(STRINGER_DENSITY),
            frame_cross_section: row.number(FRAME_CROSS_SECTION),
            frame_density: row.number(FRAME_DENSITY),
            skin_thickness: row.number(SKIN_THICKNESS),
            extra: row.extra(Self::COLUMNS),
        })
    }

    fn value(&self, column: &str) -> Value {
        match column {
            STRINGER_PITCH => number_value(Some(self.stringer_pitch)),
            FRAME_PITCH => Value::String(self.frame_pitch.clone()),
            STRINGER_LENGTH => number_value(self.stringer_length),
            FRAME_LENGTH => number_value(self.frame_length),
            STRINGER_CROSS_SECTION => number_value(self.stringer_cross_section),
            STRINGER_DENSITY => number_value(self.stringer_density),
            FRAME_CROSS_SECTION => number_value(self.frame_cross_section),
            FRAME_DENSITY => number_value(self.frame_density),
            SKIN_THICKNESS => number_value(self.skin_thickness),
            other => self.extra.get(other).cloned().unwrap_or(Value::Null),
        }
    }
}

impl TableRecord for SkinCellRecord {
    const COLUMNS: &'static [&'static str] = &[
        ZONE_NAME,
        ROW,
        COLUMN,
        SKIN_DENSITY,
        SKIN_THICKNESS,
        WEIGHT,
        STRINGER_LENGTH,
        FRAME_LENGTH,
    ];

    fn from_row(row: &Row) -> Result<Self, SkinError> {
        Ok(SkinCellRecord {
            zone_name: row.required_id(ZONE_NAME)?,
            row: row.required_number(ROW)?,
            column: row.required_id(COLUMN)?,
            skin_density: row.number(SKIN_DENSITY),
            skin_thickness: row.number(SKIN_THICKNESS),
            weight: row.number(WEIGHT),
            stringer_length: row.number(STRINGER_LENGTH),
            frame_length: row.number(FRAME_LENGTH),
            extra: row.extra(Self::COLUMNS),
        })
    }

    fn value(&self, column: &str) -> Value {
        match column {
            ZONE_NAME => Value::String(self.zone_name.clone()),
            ROW => number_value(Some(self.row)),
            COLUMN => Value::String(self.column.clone()),
            SKIN_DENSITY => number_value(self.skin_density),
            SKIN_THICKNESS => number_value(self.skin_thickness),
            WEIGHT => number_value(self.weight),
            STRINGER_LENGTH => number_value(self.stringer_length),
            FRAME_LENGTH => number_value(self.frame_length),
            other => self.extra.get(other).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Decodes a split-orient table payload into typed records
///
/// The payload may be the `{columns, index, data}` object itself or a string
/// holding it. `null` decodes to an empty table.
///
/// # Arguments
/// * `payload` - The table payload
/// * `name` - Table name used in error messages
///
/// # Returns
/// The decoded table, or `MissingTable` when the payload is malformed
pub fn decode_table<R: TableRecord>(payload: &Value, name: &str) -> Result<Table<R>, SkinError> {
    let parsed: Value;
    let object = match payload {
        Value::Null => return Ok(Table::default()),
        Value::String(s) if s.trim().is_empty() => return Ok(Table::default()),
        Value::String(s) => {
            parsed = match serde_json::from_str(s) {
                Ok(v) => v,
                Err(err) => {
                    return Err(SkinError::MissingTable(format!(
                        "{name} payload is not valid json: {err}"
                    )))
                }
            };
            &parsed
        }
        other => other,
    };

    let columns: Vec<String> = match object.get("columns").and_then(Value::as_array) {
        Some(cols) => cols
            .iter()
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        None => {
            return Err(SkinError::MissingTable(format!(
                "{name} payload missing columns field"
            )))
        }
    };

    let data = match object.get("data").and_then(Value::as_array) {
        Some(d) => d,
        None => {
            return Err(SkinError::MissingTable(format!(
                "{name} payload missing data field"
            )))
        }
    };

    let mut rows: Vec<R> = Vec::with_capacity(data.len());
    for (position, values) in data.iter().enumerate() {
        let values = match values.as_array() {
            Some(v) if v.len() == columns.len() => v,
            _ => {
                return Err(SkinError::MissingTable(format!(
                    "{name} row {position} does not match the {} declared columns",
                    columns.len()
                )))
            }
        };
        let row = Row {
            columns: &columns,
            values,
            position,
        };
        rows.push(R::from_row(&row).map_err(|err| match err {
            SkinError::MissingTable(msg) => SkinError::MissingTable(format!("{name} {msg}")),
            other => other,
        })?);
    }

    let index = match object.get("index").and_then(Value::as_array) {
        Some(index) if index.len() == rows.len() => index.clone(),
        _ => (0..rows.len()).map(|i| json!(i)).collect(),
    };

    Ok(Table {
        columns,
        index,
        rows,
    })
}

/// Encodes a table back into split-orient json, preserving column order
pub fn encode_table<R: TableRecord>(table: &Table<R>) -> Value {
    let data: Vec<Value> = table
        .rows
        .iter()
        .map(|r| Value::Array(table.columns.iter().map(|c| r.value(c)).collect()))
        .collect();

    json!({
        "columns": table.columns,
        "index": table.index,
        "data": data,
    })
}

/// Decodes the zone list. `null` decodes to no zones
pub fn decode_zones(payload: &Value) -> Result<Vec<Zone>, SkinError> {
    if payload.is_null() {
        return Ok(Vec::new());
    }
    match serde_json::from_value(payload.clone()) {
        Ok(zones) => Ok(zones),
        Err(err) => Err(SkinError::Input(format!("Bad zone list: {err}"))),
    }
}

/// Decodes a full state document with `main_data`, `skin_data` and `panels`
pub fn decode_state(document: &Value) -> Result<SkinState, SkinError> {
    if !document.is_object() {
        return Err(SkinError::Input(
            "State document must be a json object".to_owned(),
        ));
    }

    let null = Value::Null;
    let raw = decode_table(document.get(MAIN_DATA_KEY).unwrap_or(&null), "raw table")?;
    let skin = decode_table(document.get(SKIN_DATA_KEY).unwrap_or(&null), "skin table")?;
    let zones = decode_zones(document.get(PANELS_KEY).unwrap_or(&null))?;

    let state = SkinState { raw, skin, zones };
    check_consistency(&state);
    Ok(state)
}

pub fn encode_state(state: &SkinState) -> Result<Value, SkinError> {
    let panels = match serde_json::to_value(&state.zones) {
        Ok(p) => p,
        Err(err) => return Err(SkinError::Output(format!("Failed to encode zones: {err}"))),
    };

    let mut document = Map::new();
    document.insert(MAIN_DATA_KEY.to_owned(), encode_table(&state.raw));
    document.insert(SKIN_DATA_KEY.to_owned(), encode_table(&state.skin));
    document.insert(PANELS_KEY.to_owned(), panels);
    Ok(Value::Object(document))
}

/// Loads a state document from disk
///
/// # Arguments
/// * `state_file` - The path to the state json file
///
/// # Returns
/// The decoded SkinState
pub fn load_state(state_file: &str) -> Result<SkinState, SkinError> {
    let contents = match std::fs::read_to_string(state_file) {
        Ok(c) => c,
        Err(err) => {
            return Err(SkinError::Input(format!(
                "Unable to open state file {state_file}: {err}"
            )))
        }
    };

    let document: Value = match serde_json::from_str(&contents) {
        Ok(d) => d,
        Err(err) => {
            return Err(SkinError::Input(format!(
                "Error in state file json: {err}"
            )))
        }
    };

    let state = decode_state(&document)?;
    log::info!(
        "loaded {} raw rows, {} skin rows and {} zones from {}",
        state.raw.len(),
        state.skin.len(),
        state.zones.len(),
        state_file
    );
    Ok(state)
}

pub fn write_state(state: &SkinState, state_file: &str) -> Result<(), SkinError> {
    let document = encode_state(state)?;
    let text = match serde_json::to_string_pretty(&document) {
        Ok(t) => t,
        Err(err) => return Err(SkinError::Output(format!("Failed to encode state: {err}"))),
    };

    if let Err(err) = std::fs::write(state_file, text) {
        return Err(SkinError::Output(format!(
            "Failed to write {state_file}: {err}"
        )));
    }

    log::info!("wrote state to {state_file}");
    Ok(())
}

/// Warns about duplicate raw keys and skin rows with no raw counterpart
pub fn check_consistency(state: &SkinState) -> usize {
    let mut problems = 0;

    let mut seen: HashSet<(u64, &str)> = HashSet::new();
    for record in &state.raw.rows {
        if !seen.insert((record.stringer_pitch.to_bits(), record.frame_pitch.as_str())) {
            log::warn!(
                "duplicate raw cell for stringer pitch {} and frame {}",
                record.stringer_pitch,
                record.frame_pitch
            );
            problems += 1;
        }
    }

    for record in &state.skin.rows {
        if !seen.contains(&(record.row.to_bits(), record.column.as_str())) {
            log::warn!(
                "skin row for zone {} at ({}, {}) has no raw cell",
                record.zone_name,
                record.row,
                record.column
            );
            problems += 1;
        }
    }

    problems
}
