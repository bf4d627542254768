//! County color CSV.

use std::path::Path;

use eclipse_map_tally_models::CountyColorRow;

use crate::ExportError;

/// Column header of the county color file.
pub const HEADER: [&str; 5] = ["CountyCode", "Tally", "Population", "Geoname", "Value"];

/// Writes one row per county; list columns are JSON arrays and unknown
/// population or name are left empty.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_color_csv(path: &Path, rows: &[CountyColorRow]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;

    for row in rows {
        let tally = serde_json::to_string(&row.tally)?;
        let population = row.population.map(|p| p.to_string()).unwrap_or_default();
        let value = serde_json::to_string(&row.value)?;

        writer.write_record([
            row.code.as_str(),
            tally.as_str(),
            population.as_str(),
            row.name.as_deref().unwrap_or_default(),
            value.as_str(),
        ])?;
    }

    writer.flush()?;
    log::info!("County color data saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use eclipse_map_census_models::CountyCode;

    use super::*;

    #[test]
    fn writes_header_and_json_list_cells() {
        let rows = vec![
            CountyColorRow {
                code: CountyCode::parse("41047").unwrap(),
                tally: vec![2.0, 0.5],
                population: Some(336_316),
                name: Some("Marion County, Oregon".to_string()),
                value: vec![1.25, -0.5],
            },
            CountyColorRow {
                code: CountyCode::parse("02158").unwrap(),
                tally: vec![0.0, 0.0],
                population: None,
                name: None,
                value: vec![-2.0, -2.0],
            },
        ];

        let path = std::env::temp_dir().join("eclipse_map_test_color.csv");
        write_color_csv(&path, &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADER);

        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "41047");
        assert_eq!(&records[0][1], "[2.0,0.5]");
        assert_eq!(&records[0][2], "336316");
        assert_eq!(&records[0][3], "Marion County, Oregon");
        assert_eq!(&records[0][4], "[1.25,-0.5]");

        assert_eq!(&records[1][0], "02158");
        assert_eq!(&records[1][2], "");
        assert_eq!(&records[1][3], "");

        let _ = std::fs::remove_file(&path);
    }
}
