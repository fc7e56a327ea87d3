use crate::{error::SkinError, projection::DisplayTable};

/// Writes a display table to a CSV file
///
/// # Arguments
/// * `table` - The formatted table to write
/// * `output` - The filename of the output csv
pub fn csv_output(table: &DisplayTable, output: &str) -> Result<(), SkinError> {
    let mut writer = match csv::Writer::from_path(output) {
        Ok(w) => w,
        Err(err) => {
            return Err(SkinError::Output(format!(
                "Failed to create {output}: {err}"
            )));
        }
    };

    let written = write_rows(&mut writer, table);

    if let Err(err) = written {
        return Err(SkinError::Output(format!(
            "Failed to write {output}: {err}"
        )));
    }

    log::info!("wrote {} rows to {}", table.rows.len(), output);
    Ok(())
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    table: &DisplayTable,
) -> Result<(), csv::Error> {
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Lays a display table out in aligned columns for the terminal
pub fn render_text(table: &DisplayTable) -> String {
    if table.columns.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{cell:<w$}", w = *width))
            .collect::<Vec<String>>()
            .join(" | ")
            .trim_end()
            .to_owned()
    };

    let mut text = line(&table.columns);
    text.push('\n');
    text.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<String>>()
            .join("-+-"),
    );
    for row in &table.rows {
        text.push('\n');
        text.push_str(&line(row));
    }
    text
}
