use clap::{Parser, Subcommand};
use serde_json::Value;

mod batch;
mod config;
mod datatypes;
mod error;
mod modal;
mod post_processor;
mod projection;
mod recompute;
mod store;

use crate::{config::Settings, error::SkinError, recompute::ZoneEdit};

#[derive(Debug, Parser)]
#[command(name = "skinweight", about = "Zone skin weight calculator")]
struct Cli {
    /// Display settings json
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply new skin properties to one zone
    Apply {
        #[arg(long)]
        state: String,
        #[arg(long)]
        zone: String,
        #[arg(long)]
        density: String,
        /// Apply this thickness to every cell of the zone
        #[arg(long)]
        thickness: Option<String>,
        /// Where to write the new state; defaults to overwriting --state
        #[arg(long)]
        output: Option<String>,
    },
    /// Open the edit form for a grid cell and optionally save new properties
    Edit {
        #[arg(long)]
        state: String,
        /// Ordinal stringer row of the clicked cell
        #[arg(long)]
        row: usize,
        /// Frame pitch id of the clicked cell
        #[arg(long)]
        column: String,
        #[arg(long)]
        density: Option<String>,
        #[arg(long)]
        thickness: Option<String>,
        #[arg(long)]
        output: Option<String>,
    },
    /// Apply a json list of zone edits in order
    Batch {
        #[arg(long)]
        state: String,
        #[arg(long)]
        edits: String,
        #[arg(long)]
        output: Option<String>,
    },
    /// Print the zone grid and its cell styles
    Grid {
        #[arg(long)]
        state: String,
        /// Also print per-cell tooltips
        #[arg(long)]
        tooltips: bool,
    },
    /// Print the per-zone skin weight summary
    Summary {
        #[arg(long)]
        state: String,
        #[arg(long)]
        csv: Option<String>,
    },
    /// Print the skin data table
    Table {
        #[arg(long)]
        state: String,
        #[arg(long)]
        csv: Option<String>,
    },
}

fn print_or_export(table: &projection::DisplayTable, csv: Option<&str>) -> Result<(), SkinError> {
    match csv {
        Some(path) => post_processor::csv_output(table, path),
        None if table.is_empty() => {
            println!("no rows");
            Ok(())
        }
        None => {
            println!("{}", post_processor::render_text(table));
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<(), SkinError> {
    let settings = Settings::load_or_default(cli.settings.as_deref())?;

    match cli.command {
        Command::Apply {
            state,
            zone,
            density,
            thickness,
            output,
        } => {
            let current = store::load_state(&state)?;
            let edit = ZoneEdit::new(
                &zone,
                Value::String(density),
                thickness.is_some(),
                thickness.map(Value::String).unwrap_or(Value::Null),
            );
            let next = recompute::apply_zone_properties(&current, &edit)?;
            store::write_state(&next, output.as_deref().unwrap_or(&state))?;

            let summary = projection::summarize_weight_by_zone(&next.skin);
            print_or_export(&projection::summary_display(&summary, &settings), None)
        }
        Command::Edit {
            state,
            row,
            column,
            density,
            thickness,
            output,
        } => {
            let current = store::load_state(&state)?;
            let cell = datatypes::Coord::new(row, &column);
            let mut form = modal::EditForm::open_for_cell(Some(&cell), &current.zones);

            let zone_name = match &form.editing_zone {
                Some(name) => name.clone(),
                None => {
                    println!("no zone covers cell {}", cell.key());
                    return Ok(());
                }
            };
            println!(
                "zone {zone_name}: density {}, thickness {}",
                form.density.map(|d| d.to_string()).unwrap_or_default(),
                form.thickness.map(|t| t.to_string()).unwrap_or_default()
            );

            let density = match density {
                Some(d) => d,
                None => return Ok(()),
            };
            form.apply_thickness = thickness.is_some();
            let next = form.save(
                &current,
                Value::String(density),
                thickness.map(Value::String).unwrap_or(Value::Null),
            )?;
            store::write_state(&next, output.as_deref().unwrap_or(&state))
        }
        Command::Batch {
            state,
            edits,
            output,
        } => {
            let current = store::load_state(&state)?;
            let edits = batch::load_edits(&edits)?;
            let (next, rejected) = batch::apply_batch(&current, &edits);
            for r in &rejected {
                eprintln!("warning: edit {} ({}) rejected: {}", r.position, r.zone_name, r.error);
            }
            store::write_state(&next, output.as_deref().unwrap_or(&state))
        }
        Command::Grid { state, tooltips } => {
            let current = store::load_state(&state)?;
            let grid = projection::project_grid(&current.raw);
            println!("{}", post_processor::render_text(&grid.display(settings.decimal_places)));

            let styles =
                projection::project_zone_styles(&grid.frame_pitches, &current.zones, &settings);
            let style_table = projection::DisplayTable {
                columns: vec![
                    "Row".to_owned(),
                    "Column".to_owned(),
                    "Background".to_owned(),
                    "Text".to_owned(),
                ],
                rows: styles
                    .into_iter()
                    .map(|s| {
                        vec![
                            s.row_index.to_string(),
                            s.column_id,
                            s.background_color,
                            s.text_color,
                        ]
                    })
                    .collect(),
            };
            println!();
            println!("{}", post_processor::render_text(&style_table));

            if tooltips {
                let rows = projection::project_tooltips(&current.raw, &current.zones, &settings);
                for (row_index, row) in rows.iter().enumerate() {
                    for (column_id, text) in row {
                        println!("\n[{row_index}-{column_id}]\n{text}");
                    }
                }
            }
            Ok(())
        }
        Command::Summary { state, csv } => {
            let current = store::load_state(&state)?;
            let summary = projection::summarize_weight_by_zone(&current.skin);
            print_or_export(&projection::summary_display(&summary, &settings), csv.as_deref())
        }
        Command::Table { state, csv } => {
            let current = store::load_state(&state)?;
            let table = projection::skin_display_table(&current.skin, &settings);
            print_or_export(&table, csv.as_deref())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1)
    }
}
