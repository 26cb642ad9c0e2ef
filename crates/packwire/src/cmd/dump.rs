use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use packwire_codec::{HeteroMap, HeteroMapPacker, Packer, TypeRegistry};
use packwire_stream::BoundedReader;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cmd::DumpArgs;
use crate::exit::{io_error, pack_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{
    hetero_json, pretty_lines, print_json, type_name, value_preview, OutputFormat,
};

#[derive(Serialize)]
struct DumpOutput {
    size: u64,
    trailing_bytes: bool,
    entries: serde_json::Value,
}

/// Result of decoding one map from the input.
#[derive(Debug)]
struct Decoded {
    map: HeteroMap,
    consumed: u64,
    trailing: bool,
}

pub fn run(args: DumpArgs, format: OutputFormat) -> CliResult<i32> {
    if args.max_bytes == 0 {
        return Err(CliError::new(USAGE, "--max-bytes must be greater than zero"));
    }

    let source = open_input(&args.input)?;
    let binary: Box<dyn Read> = if args.hex {
        Box::new(Cursor::new(read_hex(source, args.max_bytes)?))
    } else {
        source
    };

    let decoded = decode(binary, args.max_bytes)?;
    if decoded.trailing {
        warn!(consumed = decoded.consumed, "input has bytes after the heteromap");
    }
    print_decoded(&decoded, format);
    Ok(SUCCESS)
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
    Ok(Box::new(file))
}

/// Hex text is read with room for whitespace, then decoded to bytes.
fn read_hex(source: Box<dyn Read>, max_bytes: u64) -> CliResult<Vec<u8>> {
    let mut text = String::new();
    BoundedReader::new(source, max_bytes.saturating_mul(3))
        .read_to_string(&mut text)
        .map_err(|err| io_error("failed reading hex input", err))?;
    crate::output::parse_hex(&text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}

fn decode(source: Box<dyn Read>, max_bytes: u64) -> CliResult<Decoded> {
    let packer = HeteroMapPacker::new(Arc::new(TypeRegistry::new()));
    let mut reader = BoundedReader::new(source, max_bytes);

    let map = match packer.unpack(&mut reader) {
        Ok(map) => map,
        Err(err) => {
            let capped = reader.remaining() == 0 && has_more(reader.get_mut())?;
            return Err(if capped {
                CliError::new(
                    DATA_INVALID,
                    format!("decode failed: input exceeds --max-bytes {max_bytes} ({err})"),
                )
            } else {
                pack_error("decode failed", err)
            });
        }
    };

    let consumed = max_bytes - reader.remaining();
    // The cap only bounds the map; trailing input is read past it.
    let trailing = has_more(reader.get_mut())?;
    debug!(entries = map.len(), consumed, "decoded heteromap");

    Ok(Decoded {
        map,
        consumed,
        trailing,
    })
}

/// Whether `source` yields at least one more byte.
fn has_more(source: &mut dyn Read) -> CliResult<bool> {
    let mut byte = [0u8; 1];
    let read = source
        .read(&mut byte)
        .map_err(|err| io_error("failed reading input", err))?;
    Ok(read > 0)
}

fn print_decoded(decoded: &Decoded, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DumpOutput {
            size: decoded.consumed,
            trailing_bytes: decoded.trailing,
            entries: hetero_json(&decoded.map),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KEY", "KEY TYPE", "VALUE", "VALUE TYPE"]);
            for entry in &decoded.map {
                table.add_row(vec![
                    value_preview(&entry.key),
                    type_name(entry.key_packer.tag()),
                    value_preview(&entry.value),
                    type_name(entry.value_packer.tag()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "heteromap ({} entries, {} bytes)",
                decoded.map.len(),
                decoded.consumed
            );
            let mut lines = Vec::new();
            pretty_lines(&decoded.map, 0, &mut lines);
            for line in lines {
                println!("{line}");
            }
        }
    }
}
