//! Read a CSV source into text cells, decoding each field with the configured
//! encoding and keeping only the retained columns.

use encoding_rs::Encoding;

use crate::data::record::{CellValue, Record};
use crate::data::store::LoadError;

#[derive(Debug, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

fn decode_field(bytes: &[u8], encoding: &'static Encoding, row: usize) -> Result<String, LoadError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or(LoadError::Encoding {
            encoding: encoding.name(),
            row,
        })
}

/// Parse `bytes` as a headed CSV table. `row` numbers in errors are 1-based data
/// rows; the header is row 0.
pub fn read_table(
    bytes: &[u8],
    encoding: &'static Encoding,
    retain: Option<&[String]>,
) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let header_record = reader.byte_headers().map_err(LoadError::Csv)?.clone();
    let mut headers = Vec::with_capacity(header_record.len());
    for (index, field) in header_record.iter().enumerate() {
        let field = if index == 0 {
            field.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(field)
        } else {
            field
        };
        headers.push(decode_field(field, encoding, 0)?.trim().to_string());
    }

    // The subset filters; output order always follows the file header.
    let indices: Vec<usize> = match retain {
        Some(wanted) => {
            if let Some(missing) = wanted.iter().find(|name| !headers.contains(*name)) {
                return Err(LoadError::MissingColumn(missing.clone()));
            }
            (0..headers.len())
                .filter(|&index| wanted.contains(&headers[index]))
                .collect()
        }
        None => (0..headers.len()).collect(),
    };
    let columns = indices.iter().map(|&index| headers[index].clone()).collect();

    let mut records = Vec::new();
    for (offset, result) in reader.byte_records().enumerate() {
        let row = offset + 1;
        let raw = result.map_err(LoadError::Csv)?;
        let mut cells = Vec::with_capacity(indices.len());
        for &index in &indices {
            let field = raw.get(index).unwrap_or_default();
            cells.push(CellValue::Text(decode_field(field, encoding, row)?));
        }
        records.push(Record { cells });
    }

    Ok(RawTable { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};

    const SAMPLE: &str = "Office Name,Pincode,District\nKakinada S.O,533001,EAST GODAVARI\nTuni S.O,533401,EAST GODAVARI\n";

    #[test]
    fn reads_all_columns_without_subset() {
        let table = read_table(SAMPLE.as_bytes(), UTF_8, None).expect("table should load");
        assert_eq!(table.columns, vec!["Office Name", "Pincode", "District"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[1].cells[0], CellValue::Text("Tuni S.O".to_string()));
    }

    #[test]
    fn subset_prunes_but_keeps_file_order() {
        let retain = vec![
            "District".to_string(),
            "Pincode".to_string(),
            "Office Name".to_string(),
        ];
        let table = read_table(SAMPLE.as_bytes(), UTF_8, Some(retain.as_slice())).expect("table should load");
        assert_eq!(table.columns, vec!["Office Name", "Pincode", "District"]);

        let retain = vec!["Pincode".to_string(), "Office Name".to_string()];
        let table = read_table(SAMPLE.as_bytes(), UTF_8, Some(retain.as_slice())).expect("table should load");
        assert_eq!(table.columns, vec!["Office Name", "Pincode"]);
        assert_eq!(
            table.records[0].cells,
            vec![
                CellValue::Text("Kakinada S.O".to_string()),
                CellValue::Text("533001".to_string())
            ]
        );
    }

    #[test]
    fn missing_subset_column_is_an_error() {
        let retain = vec!["StateName".to_string()];
        assert!(matches!(
            read_table(SAMPLE.as_bytes(), UTF_8, Some(retain.as_slice())),
            Err(LoadError::MissingColumn(name)) if name == "StateName"
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let ragged = "a,b\n1,2\n3\n";
        assert!(matches!(
            read_table(ragged.as_bytes(), UTF_8, None),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn encoding_is_applied_per_field() {
        let latin1: &[u8] = b"Office Name,Pincode\nK\xE9rala B.O,682001\n";
        let table = read_table(latin1, WINDOWS_1252, None).expect("latin1 should decode");
        assert_eq!(table.records[0].cells[0], CellValue::Text("K\u{e9}rala B.O".to_string()));

        assert!(matches!(
            read_table(latin1, UTF_8, None),
            Err(LoadError::Encoding { row: 1, .. })
        ));
    }

    #[test]
    fn utf8_bom_is_stripped_from_first_header() {
        let with_bom = "\u{feff}Pincode\n533001\n";
        let table = read_table(with_bom.as_bytes(), UTF_8, None).expect("table should load");
        assert_eq!(table.columns, vec!["Pincode"]);
    }
}
