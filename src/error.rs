use std::num::{ParseFloatError, ParseIntError};
use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum TcxError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Trackpoint #{trackpoint} has no <{element}> value")]
    MissingValue {
        element: &'static str,
        trackpoint: u64,
    },

    #[error("Invalid value '{value}' in <{element}>: {reason}")]
    InvalidValue {
        element: &'static str,
        value: String,
        reason: String,
    },

    #[error("Document ended inside trackpoint #{trackpoint}")]
    UnclosedTrackpoint { trackpoint: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TcxError {
    pub(crate) fn invalid_float(element: &'static str, value: &str, e: ParseFloatError) -> Self {
        Self::InvalidValue {
            element,
            value: value.to_string(),
            reason: e.to_string(),
        }
    }

    pub(crate) fn invalid_int(element: &'static str, value: &str, e: ParseIntError) -> Self {
        Self::InvalidValue {
            element,
            value: value.to_string(),
            reason: e.to_string(),
        }
    }
}

impl From<TcxError> for JsValue {
    fn from(e: TcxError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
