use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::TcxError;
use crate::tcx_types::Trackpoint;

type Result<T> = std::result::Result<T, TcxError>;

const DISTANCE: &str = "DistanceMeters";
const ALTITUDE: &str = "AltitudeMeters";

/// Value elements read inside a trackpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Distance,
    Altitude,
}

impl Field {
    fn element(self) -> &'static str {
        match self {
            Field::Distance => DISTANCE,
            Field::Altitude => ALTITUDE,
        }
    }
}

/// Elements the reader reacts to. Everything else is walked over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Trackpoint,
    Value(Field),
    Other,
}

impl Tag {
    fn from_local_name(name: &[u8]) -> Self {
        match name {
            b"Trackpoint" => Tag::Trackpoint,
            b"DistanceMeters" => Tag::Value(Field::Distance),
            b"AltitudeMeters" => Tag::Value(Field::Altitude),
            _ => Tag::Other,
        }
    }
}

/// Values collected for the trackpoint currently open.
#[derive(Debug, Default)]
struct PendingPoint {
    distance: Option<f64>,
    altitude: Option<i64>,
}

impl PendingPoint {
    fn finish(self, index: u64) -> Result<Trackpoint> {
        let distance = self.distance.ok_or(TcxError::MissingValue {
            element: DISTANCE,
            trackpoint: index,
        })?;
        let altitude = self.altitude.ok_or(TcxError::MissingValue {
            element: ALTITUDE,
            trackpoint: index,
        })?;
        Ok(Trackpoint::new(distance, altitude))
    }
}

/// Lazy, single-pass sequence of trackpoints read from a TCX document.
///
/// Only `DistanceMeters` and `AltitudeMeters` found inside a `Trackpoint`
/// element are read; lap totals and every other element are skipped. The
/// iterator stops for good after yielding its first error.
pub struct Trackpoints<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    text: String,
    pending: Option<PendingPoint>,
    capture: Option<Field>,
    index: u64,
    done: bool,
}

impl<'a> Trackpoints<&'a [u8]> {
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(Reader::from_str(xml))
    }
}

impl<R: BufRead> Trackpoints<R> {
    pub fn from_reader(input: R) -> Self {
        Self::new(Reader::from_reader(input))
    }

    fn new(reader: Reader<R>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            text: String::new(),
            pending: None,
            capture: None,
            index: 0,
            done: false,
        }
    }

    fn read_trackpoint(&mut self) -> Result<Option<Trackpoint>> {
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            let (tag, opening) = match event {
                Event::Start(e) => (Tag::from_local_name(e.local_name().as_ref()), true),
                Event::End(e) => (Tag::from_local_name(e.local_name().as_ref()), false),
                Event::Empty(e) => {
                    // `<Trackpoint/>` still counts as a trackpoint, one with no values.
                    if Tag::from_local_name(e.local_name().as_ref()) == Tag::Trackpoint {
                        self.index += 1;
                        self.capture = None;
                        self.pending = None;
                        return PendingPoint::default().finish(self.index).map(Some);
                    }
                    continue;
                }
                Event::Text(e) => {
                    if let Some(field) = self.capture {
                        push_utf8(&mut self.text, e.as_ref(), field.element())?;
                    }
                    continue;
                }
                Event::CData(e) => {
                    if let Some(field) = self.capture {
                        push_utf8(&mut self.text, e.as_ref(), field.element())?;
                    }
                    continue;
                }
                Event::GeneralRef(e) => {
                    let Some(field) = self.capture else {
                        continue;
                    };
                    if let Some(ch) = e.resolve_char_ref()? {
                        self.text.push(ch);
                        continue;
                    }
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => self.text.push('&'),
                        "lt" => self.text.push('<'),
                        "gt" => self.text.push('>'),
                        "quot" => self.text.push('"'),
                        "apos" => self.text.push('\''),
                        // Unknown entity: keep it raw so the number parse fails.
                        _ => {
                            self.text.push('&');
                            push_utf8(&mut self.text, e.as_ref(), field.element())?;
                            self.text.push(';');
                        }
                    }
                    continue;
                }
                Event::Eof => {
                    if self.pending.is_some() {
                        return Err(TcxError::UnclosedTrackpoint {
                            trackpoint: self.index,
                        });
                    }
                    return Ok(None);
                }
                _ => continue,
            };

            match (tag, opening) {
                (Tag::Trackpoint, true) => {
                    self.index += 1;
                    self.pending = Some(PendingPoint::default());
                    self.capture = None;
                }
                (Tag::Trackpoint, false) => {
                    self.capture = None;
                    if let Some(point) = self.pending.take() {
                        return point.finish(self.index).map(Some);
                    }
                }
                (Tag::Value(field), true) if self.pending.is_some() => {
                    self.capture = Some(field);
                    self.text.clear();
                }
                (Tag::Value(field), false) if self.capture == Some(field) => {
                    self.capture = None;
                    self.store_value(field)?;
                }
                _ => {}
            }
        }
    }

    fn store_value(&mut self, field: Field) -> Result<()> {
        let raw = self.text.trim();
        // Blank content leaves the value unset, which surfaces as a missing
        // value once the trackpoint closes.
        if raw.is_empty() {
            return Ok(());
        }
        let Some(point) = self.pending.as_mut() else {
            return Ok(());
        };
        match field {
            Field::Distance => {
                let value = raw
                    .parse::<f64>()
                    .map_err(|e| TcxError::invalid_float(DISTANCE, raw, e))?;
                point.distance = Some(value);
            }
            Field::Altitude => {
                let value = raw
                    .parse::<i64>()
                    .map_err(|e| TcxError::invalid_int(ALTITUDE, raw, e))?;
                point.altitude = Some(value);
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for Trackpoints<R> {
    type Item = Result<Trackpoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_trackpoint() {
            Ok(Some(point)) => Some(Ok(point)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn push_utf8(text: &mut String, bytes: &[u8], element: &'static str) -> Result<()> {
    let s = std::str::from_utf8(bytes).map_err(|e| TcxError::InvalidValue {
        element,
        value: String::from_utf8_lossy(bytes).into_owned(),
        reason: e.to_string(),
    })?;
    text.push_str(s);
    Ok(())
}
