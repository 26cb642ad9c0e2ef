use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use packwire_codec::builtin;
use serde::Serialize;

use crate::cmd::IdsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct TypeIdRow {
    id: i32,
    name: &'static str,
    family: &'static str,
}

pub fn run(_args: IdsArgs, format: OutputFormat) -> CliResult<i32> {
    let rows = rows();
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "FAMILY"]);
            for row in &rows {
                table.add_row(vec![
                    row.id.to_string(),
                    row.name.to_string(),
                    row.family.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                println!("{:>4}  {:<18} {}", row.id, row.name, row.family);
            }
        }
    }
    Ok(SUCCESS)
}

fn rows() -> Vec<TypeIdRow> {
    builtin::ids()
        .into_iter()
        .chain(std::iter::once(builtin::HETERO_MAP))
        .filter_map(|id| {
            builtin::name(id).map(|name| TypeIdRow {
                id,
                name,
                family: family(id),
            })
        })
        .collect()
}

fn family(id: i32) -> &'static str {
    match id {
        builtin::HETERO_MAP => "nested",
        builtin::LIST_OF_INT8..=builtin::LIST_OF_STR => "list",
        builtin::MAP_OF_INT32_INT32..=builtin::MAP_OF_STR_STR => "map",
        _ => "scalar",
    }
}
