pub mod error;
pub mod options;
pub mod parser;
pub mod segmenter;
pub mod tcx_types;
pub mod tsv;

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use wasm_bindgen::prelude::*;

use crate::error::TcxError;
use crate::options::SegmentOptions;
use crate::parser::Trackpoints;
use crate::segmenter::Legs;
use crate::tcx_types::Leg;
use crate::tsv::TsvWriter;

pub type Result<T> = std::result::Result<T, TcxError>;

/// Suffix appended to the input path to name the output table.
pub const OUTPUT_SUFFIX: &str = ".tsv";

/// What a finished conversion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSummary {
    pub trackpoints: u64,
    pub legs: u64,
    /// Trailing leg discarded because it never reached the threshold.
    pub dropped: Option<Leg>,
}

/// Stream a TCX document from `input` into a leg table on `output`.
///
/// Rows are written as soon as their leg closes. On failure the rows already
/// written are flushed before the error is returned.
pub fn convert<R: BufRead, W: Write>(
    input: R,
    output: W,
    opts: &SegmentOptions,
) -> Result<ConvertSummary> {
    let mut tsv = TsvWriter::new(output)?;
    let mut legs = Legs::new(Trackpoints::from_reader(input), opts);

    for leg in legs.by_ref() {
        let written = leg.and_then(|leg| tsv.write_leg(&leg).map_err(TcxError::from));
        if let Err(e) = written {
            if let Err(flush_err) = tsv.flush() {
                warn!("Failed to flush partial output: {flush_err}");
            }
            return Err(e);
        }
    }

    let summary = ConvertSummary {
        trackpoints: legs.consumed(),
        legs: tsv.rows(),
        dropped: legs.dropped().copied(),
    };
    tsv.finish()?;
    Ok(summary)
}

/// Convert an in-memory TCX document to the TSV table text.
pub fn convert_str(tcx: &str, opts: &SegmentOptions) -> Result<String> {
    let mut out = Vec::new();
    convert(tcx.as_bytes(), &mut out, opts)?;
    // Every byte written comes from ASCII literals and number formatting.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Legs of an in-memory TCX document.
pub fn legs_from_str(tcx: &str, opts: &SegmentOptions) -> Result<Vec<Leg>> {
    Legs::new(Trackpoints::from_str(tcx), opts).collect()
}

/// Output path for `input`: its literal text with `.tsv` appended.
pub fn output_path_for(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// Convert the TCX file at `input`, writing the table next to it.
///
/// Returns the output path alongside the summary.
pub fn convert_file(input: &Path, opts: &SegmentOptions) -> Result<(PathBuf, ConvertSummary)> {
    let reader = BufReader::new(File::open(input)?);
    let output = output_path_for(input);
    let writer = BufWriter::new(File::create(&output)?);

    let summary = convert(reader, writer, opts)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        trackpoints = summary.trackpoints,
        legs = summary.legs,
        "Conversion finished"
    );
    Ok((output, summary))
}

/// Convert a TCX string to the leg table, returned as TSV text.
#[wasm_bindgen(js_name = tcxToTsv)]
pub fn tcx_to_tsv(tcx_string: &str, options: JsValue) -> std::result::Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    convert_str(tcx_string, &opts).map_err(JsValue::from)
}

/// Convert a TCX string to the leg records, returned as a JS array.
#[wasm_bindgen(js_name = tcxToLegs)]
pub fn tcx_to_legs(tcx_string: &str, options: JsValue) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let legs = legs_from_str(tcx_string, &opts)?;
    serde_wasm_bindgen::to_value(&legs).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(options: JsValue) -> std::result::Result<SegmentOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(SegmentOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"<?xml version="1.0"?>
<TrainingCenterDatabase>
  <Trackpoint><DistanceMeters>0</DistanceMeters><AltitudeMeters>100</AltitudeMeters></Trackpoint>
  <Trackpoint><DistanceMeters>40</DistanceMeters><AltitudeMeters>105</AltitudeMeters></Trackpoint>
  <Trackpoint><DistanceMeters>85</DistanceMeters><AltitudeMeters>102</AltitudeMeters></Trackpoint>
  <Trackpoint><DistanceMeters>130</DistanceMeters><AltitudeMeters>110</AltitudeMeters></Trackpoint>
  <Trackpoint><DistanceMeters>200</DistanceMeters><AltitudeMeters>108</AltitudeMeters></Trackpoint>
</TrainingCenterDatabase>"#;

    #[test]
    fn test_convert_scenario() {
        let tsv = convert_str(SCENARIO, &SegmentOptions::default()).unwrap();
        assert_eq!(tsv, "Total\tLap\tDistance\tUp\tDown\n4\t4\t130.000000\t13\t-3\n");
    }

    #[test]
    fn test_summary_reports_dropped_leg() {
        let mut out = Vec::new();
        let summary = convert(SCENARIO.as_bytes(), &mut out, &SegmentOptions::default()).unwrap();
        assert_eq!(summary.trackpoints, 5);
        assert_eq!(summary.legs, 1);
        let dropped = summary.dropped.unwrap();
        assert_eq!(dropped.lap_points, 1);
        assert!((dropped.distance - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_with_flush() {
        let mut out = Vec::new();
        let summary = convert(SCENARIO.as_bytes(), &mut out, &SegmentOptions::flushing()).unwrap();
        assert_eq!(summary.legs, 2);
        assert!(summary.dropped.is_none());
        assert!(String::from_utf8(out).unwrap().ends_with("5\t1\t70.000000\t0\t-2\n"));
    }

    #[test]
    fn test_legs_from_str() {
        let legs = legs_from_str(SCENARIO, &SegmentOptions::default()).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].up, 13);
    }

    #[test]
    fn test_rows_kept_before_failure() {
        let xml = r#"<Track>
  <Trackpoint><DistanceMeters>0</DistanceMeters><AltitudeMeters>1</AltitudeMeters></Trackpoint>
  <Trackpoint><DistanceMeters>150</DistanceMeters><AltitudeMeters>2</AltitudeMeters></Trackpoint>
  <Trackpoint><DistanceMeters>160</DistanceMeters></Trackpoint>
</Track>"#;
        let mut out = Vec::new();
        let err = convert(xml.as_bytes(), &mut out, &SegmentOptions::default()).unwrap_err();
        assert!(matches!(err, TcxError::MissingValue { trackpoint: 3, .. }));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Total\tLap\tDistance\tUp\tDown\n2\t2\t150.000000\t1\t0\n"
        );
    }

    #[test]
    fn test_output_path_appends_suffix() {
        assert_eq!(
            output_path_for(Path::new("runs/morning.tcx")),
            PathBuf::from("runs/morning.tcx.tsv")
        );
        assert_eq!(output_path_for(Path::new("track")), PathBuf::from("track.tsv"));
    }
}
