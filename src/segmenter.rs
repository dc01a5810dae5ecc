use tracing::debug;

use crate::options::SegmentOptions;
use crate::tcx_types::{Leg, Trackpoint};

/// Accumulated distance at which a leg is closed, in the units of
/// `DistanceMeters`.
pub const LEG_DISTANCE: f64 = 100.0;

/// Elapsed time credited to every trackpoint. TCX timestamps are not read.
pub const SECONDS_PER_TRACKPOINT: u64 = 1;

/// Running state of the leg currently being built.
#[derive(Debug, Default, Clone, Copy)]
struct LegAccumulator {
    distance: f64,
    up: i64,
    down: i64,
    points: u64,
}

impl LegAccumulator {
    fn add_delta(&mut self, last: &Trackpoint, cur: &Trackpoint) {
        self.distance += cur.distance_meters - last.distance_meters;
        let climb = cur.altitude_meters - last.altitude_meters;
        // A flat step counts as descent (adds 0).
        if climb > 0 {
            self.up += climb;
        } else {
            self.down += climb;
        }
    }

    fn to_leg(self, total_seconds: u64) -> Leg {
        Leg {
            total_seconds,
            lap_points: self.points,
            distance: self.distance,
            up: self.up,
            down: self.down,
        }
    }
}

/// Streaming fold from trackpoints to ~100 m legs.
///
/// Holds only the previous trackpoint and the open leg, so a track of any
/// length is segmented in constant memory.
#[derive(Debug, Default)]
pub struct Segmenter {
    last: Option<Trackpoint>,
    leg: LegAccumulator,
    total_seconds: u64,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next trackpoint; returns the leg it closes, if any.
    pub fn push(&mut self, cur: Trackpoint) -> Option<Leg> {
        if let Some(last) = &self.last {
            self.leg.add_delta(last, &cur);
        }
        self.last = Some(cur);
        self.leg.points += 1;
        self.total_seconds += SECONDS_PER_TRACKPOINT;

        if self.leg.distance >= LEG_DISTANCE {
            let leg = self.leg.to_leg(self.total_seconds);
            self.leg = LegAccumulator::default();
            Some(leg)
        } else {
            None
        }
    }

    /// The leg still open, if it holds any trackpoints.
    pub fn partial(&self) -> Option<Leg> {
        (self.leg.points > 0).then(|| self.leg.to_leg(self.total_seconds))
    }
}

/// Lazy adapter turning a stream of trackpoints into a stream of legs.
///
/// The first upstream error is passed through and ends the stream; no partial
/// leg is flushed after a failure.
pub struct Legs<I> {
    points: I,
    segmenter: Option<Segmenter>,
    flush_partial_leg: bool,
    consumed: u64,
    dropped: Option<Leg>,
}

impl<I> Legs<I> {
    pub fn new(points: I, opts: &SegmentOptions) -> Self {
        Self {
            points,
            segmenter: Some(Segmenter::new()),
            flush_partial_leg: opts.flush_partial_leg,
            consumed: 0,
            dropped: None,
        }
    }

    /// Trackpoints pulled from upstream so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// The trailing leg discarded at end of stream (only without flushing).
    pub fn dropped(&self) -> Option<&Leg> {
        self.dropped.as_ref()
    }
}

impl<I, E> Iterator for Legs<I>
where
    I: Iterator<Item = Result<Trackpoint, E>>,
{
    type Item = Result<Leg, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let segmenter = self.segmenter.as_mut()?;
        loop {
            match self.points.next() {
                Some(Ok(point)) => {
                    self.consumed += 1;
                    if let Some(leg) = segmenter.push(point) {
                        debug!(
                            total = leg.total_seconds,
                            lap = leg.lap_points,
                            distance = leg.distance,
                            "Leg closed"
                        );
                        return Some(Ok(leg));
                    }
                }
                Some(Err(e)) => {
                    self.segmenter = None;
                    return Some(Err(e));
                }
                None => {
                    let partial = self.segmenter.take().and_then(|s| s.partial());
                    if self.flush_partial_leg {
                        return partial.map(Ok);
                    }
                    if let Some(leg) = &partial {
                        debug!(
                            lap = leg.lap_points,
                            distance = leg.distance,
                            "Dropping trailing partial leg"
                        );
                    }
                    self.dropped = partial;
                    return None;
                }
            }
        }
    }
}

/// Segment an in-memory track.
pub fn segment<P>(points: P, opts: &SegmentOptions) -> Vec<Leg>
where
    P: IntoIterator<Item = Trackpoint>,
{
    Legs::new(
        points.into_iter().map(Ok::<_, std::convert::Infallible>),
        opts,
    )
    .map(|leg| match leg {
        Ok(leg) => leg,
        Err(never) => match never {},
    })
    .collect()
}
