//! Benchmark variant descriptor.
//!
//! A variant is resolved once from a name such as `8loads_profiling` and is
//! immutable afterwards. The name grammar is
//!
//! ```text
//! <streams><direction>[_struct|_profiling]
//!   streams   = 4 | 5 | 8
//!   direction = loads | stores
//!   _struct     only with 4 streams   (interleaved-record layout)
//!   _profiling  only with 8 streams   (device event timing)
//! ```
//!
//! Anything else is rejected.

use std::fmt;
use std::str::FromStr;

use crate::defaults::MAX_STREAMS;
use crate::error::VariantParseError;
use crate::record::RECORD_WIDTH;

/// Which way the operand streams flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Secondary streams go device-ward and are summed into one result.
    Load,
    /// One input goes device-ward and is fanned out into the secondary streams.
    Store,
}

/// Physical layout of the secondary streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// One contiguous buffer per stream.
    Array,
    /// One buffer of fixed-size records, one field per stream.
    Record,
}

/// How the compute phase is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingMode {
    /// Host wall clock around a blocking dispatch.
    External,
    /// Start/end timestamps reported by the device for the kernel event.
    DeviceEvent,
}

/// Resolved benchmark configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    direction: Direction,
    streams: usize,
    layout: Layout,
    timing: TimingMode,
}

const ALL: [Variant; 10] = [
    Variant::new(Direction::Load, 4, Layout::Array, TimingMode::External),
    Variant::new(Direction::Store, 4, Layout::Array, TimingMode::External),
    Variant::new(Direction::Load, RECORD_WIDTH, Layout::Record, TimingMode::External),
    Variant::new(Direction::Store, RECORD_WIDTH, Layout::Record, TimingMode::External),
    Variant::new(Direction::Load, 5, Layout::Array, TimingMode::External),
    Variant::new(Direction::Store, 5, Layout::Array, TimingMode::External),
    Variant::new(Direction::Load, 8, Layout::Array, TimingMode::External),
    Variant::new(Direction::Store, 8, Layout::Array, TimingMode::External),
    Variant::new(Direction::Load, 8, Layout::Array, TimingMode::DeviceEvent),
    Variant::new(Direction::Store, 8, Layout::Array, TimingMode::DeviceEvent),
];

impl Variant {
    const fn new(direction: Direction, streams: usize, layout: Layout, timing: TimingMode) -> Self {
        Self {
            direction,
            streams,
            layout,
            timing,
        }
    }

    /// Every valid variant, in the order they are usually reported.
    #[must_use]
    pub const fn all() -> &'static [Variant] {
        &ALL
    }

    /// Resolve a variant from its components.
    ///
    /// Returns `None` for combinations that are not benchmarks (e.g. a
    /// record layout with 8 streams, or more than [`MAX_STREAMS`] streams).
    #[must_use]
    pub fn from_parts(
        direction: Direction,
        streams: usize,
        layout: Layout,
        timing: TimingMode,
    ) -> Option<Self> {
        if streams == 0 || streams > MAX_STREAMS {
            return None;
        }
        ALL.iter().copied().find(|v| {
            v.direction == direction
                && v.stream_count() == streams
                && v.layout == layout
                && v.timing == timing
        })
    }

    /// Flow direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of secondary streams (4, 5 or 8).
    #[must_use]
    pub const fn stream_count(&self) -> usize {
        self.streams
    }

    /// Secondary-stream layout.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Compute-phase timing discipline.
    #[must_use]
    pub const fn timing(&self) -> TimingMode {
        self.timing
    }

    /// Whether the compute phase uses device event timestamps.
    #[must_use]
    pub const fn is_profiling(&self) -> bool {
        matches!(self.timing, TimingMode::DeviceEvent)
    }

    /// Canonical name, accepted back by [`FromStr`].
    #[must_use]
    pub fn name(&self) -> String {
        let direction = match self.direction {
            Direction::Load => "loads",
            Direction::Store => "stores",
        };
        let suffix = match (self.layout, self.timing) {
            (Layout::Record, _) => "_struct",
            (Layout::Array, TimingMode::DeviceEvent) => "_profiling",
            (Layout::Array, TimingMode::External) => "",
        };
        format!("{}{direction}{suffix}", self.streams)
    }

    /// Streams moved host→device before each compute.
    #[must_use]
    pub const fn streams_in(&self) -> usize {
        match self.direction {
            Direction::Load => self.streams,
            Direction::Store => 1,
        }
    }

    /// Streams moved device→host after each compute.
    #[must_use]
    pub const fn streams_out(&self) -> usize {
        match self.direction {
            Direction::Load => 1,
            Direction::Store => self.streams,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Variant {
    type Err = VariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s;
        let mut chars = name.chars();
        let streams = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| VariantParseError::unknown(name))? as usize;
        let rest = chars.as_str();

        let (direction, suffix) = if let Some(tail) = rest.strip_prefix("loads") {
            (Direction::Load, tail)
        } else if let Some(tail) = rest.strip_prefix("stores") {
            (Direction::Store, tail)
        } else {
            return Err(VariantParseError::unknown(name));
        };

        let (layout, timing) = match suffix {
            "" => (Layout::Array, TimingMode::External),
            "_struct" => (Layout::Record, TimingMode::External),
            "_profiling" => (Layout::Array, TimingMode::DeviceEvent),
            _ => return Err(VariantParseError::unknown(name)),
        };

        Self::from_parts(direction, streams, layout, timing)
            .ok_or_else(|| VariantParseError::unknown(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_round_trips() {
        for v in Variant::all() {
            let parsed: Variant = v.name().parse().unwrap();
            assert_eq!(&parsed, v);
        }
    }

    #[test]
    fn profiling_8_loads() {
        let v: Variant = "8loads_profiling".parse().unwrap();
        assert_eq!(v.direction(), Direction::Load);
        assert_eq!(v.stream_count(), 8);
        assert_eq!(v.layout(), Layout::Array);
        assert!(v.is_profiling());
    }

    #[test]
    fn struct_only_with_four_streams() {
        assert!("4stores_struct".parse::<Variant>().is_ok());
        assert!("5loads_struct".parse::<Variant>().is_err());
        assert!("8stores_struct".parse::<Variant>().is_err());
    }

    #[test]
    fn profiling_only_with_eight_streams() {
        assert!("8stores_profiling".parse::<Variant>().is_ok());
        assert!("4loads_profiling".parse::<Variant>().is_err());
        assert!("5stores_profiling".parse::<Variant>().is_err());
    }

    #[test]
    fn rejects_unknown_names() {
        for bad in ["", "loads", "3loads", "6stores", "8load", "8loads16", "4loads_struct_profiling"] {
            let err = bad.parse::<Variant>().unwrap_err();
            assert_eq!(err.name, bad);
            assert!(err.expected.contains("8loads_profiling"));
        }
    }

    #[test]
    fn transfer_stream_counts() {
        let load: Variant = "5loads".parse().unwrap();
        assert_eq!((load.streams_in(), load.streams_out()), (5, 1));
        let store: Variant = "8stores".parse().unwrap();
        assert_eq!((store.streams_in(), store.streams_out()), (1, 8));
    }

    #[test]
    fn surrounding_whitespace_is_rejected() {
        for bad in [" 8loads", "8loads ", " 8loads ", "8loads\n", "\t4stores_struct"] {
            let err = bad.parse::<Variant>().unwrap_err();
            assert_eq!(err.name, bad);
        }
    }

    #[test]
    fn stream_counts_stay_within_limit() {
        assert!(Variant::all().iter().all(|v| (1..=MAX_STREAMS).contains(&v.stream_count())));
        assert_eq!(
            Variant::from_parts(Direction::Load, MAX_STREAMS + 1, Layout::Array, TimingMode::External),
            None
        );
        assert_eq!(Variant::from_parts(Direction::Store, 0, Layout::Array, TimingMode::External), None);
        assert!("9loads".parse::<Variant>().is_err());
    }

    #[test]
    fn record_variants_use_record_width() {
        for v in Variant::all().iter().filter(|v| v.layout() == Layout::Record) {
            assert_eq!(v.stream_count(), RECORD_WIDTH, "{v}");
        }
    }

    #[test]
    fn ten_variants() {
        assert_eq!(Variant::all().len(), 10);
    }
}
