//! Product CSV export → seed JSON
//!
//! The export has a `상품명` (product name) column and a `위치명` (location)
//! column whose value is a space-separated `main sub final` path.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use stockroom_core::{Item, LocationPath, NewItem};

use crate::error::{Result, SeedError};

pub const NAME_COLUMN: &str = "상품명";
pub const LOCATION_COLUMN: &str = "위치명";

const BOM: char = '\u{feff}';

/// One converted row, in the shape written to the seed JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedItem {
    pub name: String,
    pub location: LocationPath,
}

impl SeedItem {
    /// Split a `위치명` value on single spaces into main/sub/final.
    ///
    /// Missing parts become empty; anything past the third part is dropped.
    pub fn from_row(name: &str, location: &str) -> Self {
        let mut parts = location.split(' ');
        let mut next = || parts.next().unwrap_or("").to_string();
        Self {
            name: name.to_string(),
            location: LocationPath {
                main: next(),
                sub: next(),
                final_: next(),
            },
        }
    }

    pub fn into_item(self) -> Item {
        Item::from_new(NewItem {
            name: self.name,
            location: self.location,
            ..Default::default()
        })
    }
}

/// Read every data row of a product CSV export.
///
/// Rows with a blank name are skipped with a warning.
pub fn convert<R: Read>(reader: R) -> Result<Vec<SeedItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |wanted: &'static str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches(BOM).trim() == wanted)
            .ok_or(SeedError::MissingColumn(wanted))
    };
    let name_idx = column(NAME_COLUMN)?;
    let location_idx = column(LOCATION_COLUMN)?;

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: usize, column: &str| {
            record.get(idx).ok_or_else(|| SeedError::Row {
                line,
                message: format!("missing {} value", column),
            })
        };
        let name = field(name_idx, NAME_COLUMN)?;
        let location = field(location_idx, LOCATION_COLUMN)?;

        if name.trim().is_empty() {
            tracing::warn!(line, "skipping row without a product name");
            continue;
        }
        items.push(SeedItem::from_row(name, location));
    }

    tracing::info!(count = items.len(), "converted CSV rows");
    Ok(items)
}

/// Write seed items as pretty JSON (2-space indent).
pub fn write_json<W: Write>(items: &[SeedItem], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, items)?;
    Ok(())
}

pub fn read_json<R: Read>(reader: R) -> Result<Vec<SeedItem>> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sales red a", "sales", "red", "a")]
    #[case("sales red", "sales", "red", "")]
    #[case("storage", "storage", "", "")]
    #[case("", "", "", "")]
    #[case("sales  red-a", "sales", "", "red-a")]
    #[case("a b c d", "a", "b", "c")]
    fn test_positional_split(
        #[case] raw: &str,
        #[case] main: &str,
        #[case] sub: &str,
        #[case] final_: &str,
    ) {
        let item = SeedItem::from_row("X", raw);
        assert_eq!(item.location, LocationPath::new(main, sub, final_));
    }

    #[test]
    fn test_convert_basic() {
        let csv = "상품명,위치명\nBandage,sales red a\n";
        let items = convert(csv.as_bytes()).unwrap();
        assert_eq!(
            items,
            vec![SeedItem {
                name: "Bandage".into(),
                location: LocationPath::new("sales", "red", "a"),
            }]
        );
    }

    #[test]
    fn test_hyphenated_segment_is_not_split() {
        let csv = "상품명,위치명\nBandage,sales red-a\n";
        let items = convert(csv.as_bytes()).unwrap();
        assert_eq!(items[0].name, "Bandage");
        assert_eq!(items[0].location, LocationPath::new("sales", "red-a", ""));
    }

    #[test]
    fn test_convert_tolerates_bom_and_extra_columns() {
        let csv = "\u{feff}코드,상품명,위치명\n1,Aspirin,preparation left la\n2,Gauze,storage\n";
        let items = convert(csv.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].location, LocationPath::main_only("storage"));
    }

    #[test]
    fn test_missing_column() {
        let err = convert("name,location\nA,sales\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SeedError::MissingColumn(NAME_COLUMN)));
    }

    #[test]
    fn test_short_row_reports_line() {
        let csv = "상품명,위치명\nA,sales\nB\n";
        match convert(csv.as_bytes()).unwrap_err() {
            SeedError::Row { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_names_skipped() {
        let csv = "상품명,위치명\n,sales\nA,sales\n";
        assert_eq!(convert(csv.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_json_shape() {
        let items = vec![SeedItem::from_row("Bandage", "sales red a")];
        let mut out = Vec::new();
        write_json(&items, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"Bandage\""));
        assert!(text.contains("\"final\": \"a\""));
        assert_eq!(read_json(text.as_bytes()).unwrap(), items);
    }
}
