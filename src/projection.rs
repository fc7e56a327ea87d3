use std::collections::{BTreeMap, HashSet};

use nalgebra::DMatrix;
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::Settings,
    datatypes::{Coord, RawTable, SkinTable, Zone, TOTAL_WEIGHT_KG, ZONE_NAME},
};

/// Formats a number for display tables
///
/// Integral values print without a fractional part, others are rounded to
/// `decimal_places` with trailing zeros dropped. Non-finite values print empty.
pub fn format_value(value: f64, decimal_places: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }

    let rounded = format!("{value:.decimal_places$}");
    if !rounded.contains('.') {
        return rounded;
    }
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_owned(),
        t => t.to_owned(),
    }
}

fn format_cell(value: &Value, decimal_places: usize) -> String {
    match value {
        Value::Null => String::new(),
        Value::Number(n) => match n.as_f64() {
            Some(f) => format_value(f, decimal_places),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A table of already formatted cells, ready for rendering or export
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Stringer pitch × frame pitch pivot of the raw table's skin thickness
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub stringer_pitches: Vec<f64>,
    pub frame_pitches: Vec<String>,
    pub thickness: DMatrix<Option<f64>>,
}

impl Grid {
    pub fn value(&self, row_index: usize, column_id: &str) -> Option<f64> {
        let col = self.frame_pitches.iter().position(|f| f == column_id)?;
        if row_index >= self.stringer_pitches.len() {
            return None;
        }
        self.thickness[(row_index, col)]
    }

    /// Renders the grid with a blank-named header column and blank data cells
    pub fn display(&self, decimal_places: usize) -> DisplayTable {
        let mut columns = vec![String::new()];
        columns.extend(self.frame_pitches.iter().cloned());

        let rows = self
            .stringer_pitches
            .iter()
            .map(|pitch| {
                let mut row = vec![format_value(*pitch, decimal_places)];
                row.extend(std::iter::repeat(String::new()).take(self.frame_pitches.len()));
                row
            })
            .collect();

        DisplayTable { columns, rows }
    }
}

/// Pivots the raw table into a grid. The first record of a duplicated
/// (stringer pitch, frame pitch) pair wins.
pub fn project_grid(raw: &RawTable) -> Grid {
    let stringer_pitches = raw.stringer_pitches();
    let frame_pitches = raw.frame_pitches();
    let mut thickness: DMatrix<Option<f64>> =
        DMatrix::from_element(stringer_pitches.len(), frame_pitches.len(), None);

    let mut filled: HashSet<(usize, usize)> = HashSet::new();
    for record in &raw.rows {
        let row = stringer_pitches.iter().position(|p| *p == record.stringer_pitch);
        let col = frame_pitches.iter().position(|f| *f == record.frame_pitch);
        if let (Some(row), Some(col)) = (row, col) {
            if filled.insert((row, col)) {
                thickness[(row, col)] = record.skin_thickness;
            }
        }
    }

    Grid {
        stringer_pitches,
        frame_pitches,
        thickness,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDirective {
    pub row_index: usize,
    pub column_id: String,
    pub background_color: String,
    pub text_color: String,
}

/// Emits one style per zone cell in zone order. Later directives win.
///
/// Cells whose column is not among `columns` are left out.
pub fn project_zone_styles(
    columns: &[String],
    zones: &[Zone],
    settings: &Settings,
) -> Vec<StyleDirective> {
    let mut styles = Vec::new();
    for zone in zones {
        let background = zone.color.as_deref().unwrap_or(&settings.default_zone_color);
        let text = zone.text_color.as_deref().unwrap_or(&settings.default_text_color);

        for coord in &zone.coords {
            if !columns.contains(&coord.column_id) {
                continue;
            }
            styles.push(StyleDirective {
                row_index: coord.row,
                column_id: coord.column_id.clone(),
                background_color: background.to_owned(),
                text_color: text.to_owned(),
            });
        }
    }
    styles
}

/// The last zone in iteration order that covers the cell
pub fn zone_for_cell<'a>(zones: &'a [Zone], coord: &Coord) -> Option<&'a Zone> {
    zones.iter().rev().find(|z| z.contains(coord))
}

/// Builds tooltip text for every grid cell, one map per grid row keyed by
/// frame pitch id
pub fn project_tooltips(
    raw: &RawTable,
    zones: &[Zone],
    settings: &Settings,
) -> Vec<BTreeMap<String, String>> {
    let grid = project_grid(raw);
    let places = settings.decimal_places;

    grid.stringer_pitches
        .iter()
        .enumerate()
        .map(|(row_index, pitch)| {
            grid.frame_pitches
                .iter()
                .map(|frame| {
                    let mut text = format!(
                        "Stringer Pitch: {} mm\nFrame Pitch: {}",
                        format_value(*pitch, places),
                        frame
                    );
                    if let Some(t) = grid.value(row_index, frame) {
                        text.push_str(&format!("\nSkin Thickness: {} mm", format_value(t, places)));
                    }
                    if let Some(zone) = zone_for_cell(zones, &Coord::new(row_index, frame)) {
                        text.push_str(&format!("\nZone: {}", zone.name));
                    }
                    (frame.clone(), text)
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneWeight {
    pub zone_name: String,
    pub total_kg: f64,
}

/// Sums skin weight per zone, in kilograms, sorted by zone name
///
/// Null weights do not contribute. Zones without skin rows are absent.
pub fn summarize_weight_by_zone(skin: &SkinTable) -> Vec<ZoneWeight> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in &skin.rows {
        let total = totals.entry(record.zone_name.as_str()).or_insert(0.0);
        if let Some(w) = record.weight.filter(|w| w.is_finite()) {
            *total += w;
        }
    }

    totals
        .into_iter()
        .map(|(zone_name, grams)| ZoneWeight {
            zone_name: zone_name.to_owned(),
            total_kg: grams / 1000.0,
        })
        .collect()
}

pub fn summary_display(summary: &[ZoneWeight], settings: &Settings) -> DisplayTable {
    if summary.is_empty() {
        return DisplayTable::default();
    }

    DisplayTable {
        columns: vec![ZONE_NAME.to_owned(), TOTAL_WEIGHT_KG.to_owned()],
        rows: summary
            .iter()
            .map(|z| {
                vec![
                    z.zone_name.clone(),
                    format_value(z.total_kg, settings.decimal_places),
                ]
            })
            .collect(),
    }
}

/// Formats the skin table for display, hiding the configured columns
pub fn skin_display_table(skin: &SkinTable, settings: &Settings) -> DisplayTable {
    use crate::store::TableRecord;

    if skin.is_empty() {
        return DisplayTable::default();
    }

    let columns: Vec<String> = skin
        .columns
        .iter()
        .filter(|c| !settings.hidden_skin_columns.contains(c))
        .cloned()
        .collect();

    let rows = skin
        .rows
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| format_cell(&record.value(c), settings.decimal_places))
                .collect()
        })
        .collect();

    DisplayTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{
        RawCellRecord, SkinCellRecord, COLUMN, FRAME_CROSS_SECTION, FRAME_DENSITY, ROW, WEIGHT,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(pitch: f64, frame: &str, thickness: Option<f64>) -> RawCellRecord {
        RawCellRecord {
            stringer_pitch: pitch,
            frame_pitch: frame.to_owned(),
            stringer_length: None,
            frame_length: None,
            stringer_cross_section: None,
            stringer_density: None,
            frame_cross_section: None,
            frame_density: None,
            skin_thickness: thickness,
            extra: BTreeMap::new(),
        }
    }

    fn skin(zone: &str, weight: Option<f64>) -> SkinCellRecord {
        SkinCellRecord {
            zone_name: zone.to_owned(),
            row: 100.0,
            column: "A".to_owned(),
            skin_density: Some(2.7),
            skin_thickness: Some(2.0),
            weight,
            stringer_length: Some(500.0),
            frame_length: Some(300.0),
            extra: BTreeMap::from([(FRAME_DENSITY.to_owned(), json!(7.8))]),
        }
    }

    fn raw_table(rows: Vec<RawCellRecord>) -> RawTable {
        RawTable {
            columns: Vec::new(),
            index: Vec::new(),
            rows,
        }
    }

    fn skin_table(rows: Vec<SkinCellRecord>) -> SkinTable {
        SkinTable {
            columns: vec![
                ZONE_NAME.to_owned(),
                ROW.to_owned(),
                COLUMN.to_owned(),
                WEIGHT.to_owned(),
                FRAME_DENSITY.to_owned(),
            ],
            index: Vec::new(),
            rows,
        }
    }

    #[test]
    fn formats_values_for_display() {
        assert_eq!(format_value(810.0, 3), "810");
        assert_eq!(format_value(1.2150000001, 3), "1.215");
        assert_eq!(format_value(0.5, 3), "0.5");
        assert_eq!(format_value(2.0 / 3.0, 2), "0.67");
        assert_eq!(format_value(0.0001, 3), "0");
        assert_eq!(format_value(f64::NAN, 3), "");
    }

    #[test]
    fn grid_keeps_first_duplicate_and_row_order() {
        let table = raw_table(vec![
            raw(150.0, "A", Some(1.5)),
            raw(100.0, "A", Some(2.0)),
            raw(150.0, "A", Some(9.9)),
            raw(100.0, "B", None),
        ]);
        let grid = project_grid(&table);

        assert_eq!(grid.stringer_pitches, vec![150.0, 100.0]);
        assert_eq!(grid.frame_pitches, vec!["A".to_owned(), "B".to_owned()]);
        assert_eq!(grid.value(0, "A"), Some(1.5));
        assert_eq!(grid.value(1, "A"), Some(2.0));
        assert_eq!(grid.value(0, "B"), None);
        assert_eq!(grid.value(5, "A"), None);
    }

    #[test]
    fn grid_display_blanks_data_cells() {
        let grid = project_grid(&raw_table(vec![
            raw(100.0, "A", Some(2.0)),
            raw(120.5, "B", Some(1.0)),
        ]));
        let display = grid.display(3);

        assert_eq!(display.columns, vec!["", "A", "B"]);
        assert_eq!(
            display.rows,
            vec![vec!["100", "", ""], vec!["120.5", "", ""]]
        );
    }

    #[test]
    fn styles_follow_zone_order_and_skip_unknown_columns() {
        let mut first = Zone::new("Z1", vec![Coord::new(0, "A"), Coord::new(0, "Q")]);
        first.color = Some("#ff0000".to_owned());
        let mut second = Zone::new("Z2", vec![Coord::new(0, "A")]);
        second.text_color = Some("white".to_owned());

        let columns = vec!["A".to_owned(), "B".to_owned()];
        let styles = project_zone_styles(&columns, &[first, second], &Settings::default());

        assert_eq!(
            styles,
            vec![
                StyleDirective {
                    row_index: 0,
                    column_id: "A".to_owned(),
                    background_color: "#ff0000".to_owned(),
                    text_color: "black".to_owned(),
                },
                StyleDirective {
                    row_index: 0,
                    column_id: "A".to_owned(),
                    background_color: "#d3d3d3".to_owned(),
                    text_color: "white".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn tooltips_name_the_last_covering_zone() {
        let table = raw_table(vec![raw(100.0, "A", Some(2.0)), raw(100.0, "B", None)]);
        let zones = vec![
            Zone::new("Z1", vec![Coord::new(0, "A")]),
            Zone::new("Z2", vec![Coord::new(0, "A")]),
        ];
        let tooltips = project_tooltips(&table, &zones, &Settings::default());

        assert_eq!(tooltips.len(), 1);
        assert_eq!(
            tooltips[0]["A"],
            "Stringer Pitch: 100 mm\nFrame Pitch: A\nSkin Thickness: 2 mm\nZone: Z2"
        );
        assert_eq!(tooltips[0]["B"], "Stringer Pitch: 100 mm\nFrame Pitch: B");
    }

    #[test]
    fn summary_groups_by_zone_in_kilograms() {
        let table = skin_table(vec![
            skin("Z2", Some(1215.0)),
            skin("Z1", Some(810.0)),
            skin("Z2", Some(785.0)),
            skin("Z3", None),
        ]);
        let summary = summarize_weight_by_zone(&table);

        assert_eq!(
            summary,
            vec![
                ZoneWeight { zone_name: "Z1".to_owned(), total_kg: 0.81 },
                ZoneWeight { zone_name: "Z2".to_owned(), total_kg: 2.0 },
                ZoneWeight { zone_name: "Z3".to_owned(), total_kg: 0.0 },
            ]
        );

        let display = summary_display(&summary, &Settings::default());
        assert_eq!(display.columns, vec![ZONE_NAME, TOTAL_WEIGHT_KG]);
        assert_eq!(display.rows[0], vec!["Z1", "0.81"]);
        assert_eq!(display.rows[1], vec!["Z2", "2"]);
    }

    #[test]
    fn empty_skin_table_summarizes_to_nothing() {
        let table = skin_table(Vec::new());
        assert!(summarize_weight_by_zone(&table).is_empty());
        assert!(summary_display(&[], &Settings::default()).is_empty());
        assert!(skin_display_table(&table, &Settings::default()).is_empty());
    }

    #[test]
    fn display_table_hides_configured_columns() {
        let table = skin_table(vec![skin("Z1", Some(810.0004))]);
        let display = skin_display_table(&table, &Settings::default());

        assert_eq!(display.columns, vec![ZONE_NAME, ROW, COLUMN, WEIGHT]);
        assert_eq!(display.rows, vec![vec!["Z1", "100", "A", "810"]]);
    }

    #[test]
    fn display_table_hides_frame_cross_section_with_or_without_trailing_space() {
        let mut record = skin("Z1", Some(810.0));
        record.extra.insert(FRAME_CROSS_SECTION.to_owned(), json!(120.0));
        record.extra.insert(format!("{FRAME_CROSS_SECTION} "), json!(120.0));
        let mut table = skin_table(vec![record]);
        table.columns.push(FRAME_CROSS_SECTION.to_owned());
        table.columns.push(format!("{FRAME_CROSS_SECTION} "));

        let display = skin_display_table(&table, &Settings::default());
        assert_eq!(display.columns, vec![ZONE_NAME, ROW, COLUMN, WEIGHT]);
    }
}
