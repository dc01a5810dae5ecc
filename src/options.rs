use serde::Deserialize;

/// Options for TCX to TSV conversion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentOptions {
    /// Emit the trailing leg that never reached the threshold (default: false)
    #[serde(default)]
    pub flush_partial_leg: bool,
}

impl SegmentOptions {
    pub fn flushing() -> Self {
        Self {
            flush_partial_leg: true,
        }
    }
}
