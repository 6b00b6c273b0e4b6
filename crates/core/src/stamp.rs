//! Filesystem-safe timestamps
//!
//! Timestamps are rendered in a fixed IANA timezone as `YYYYMMDDHHMMSS`,
//! so the same instant always yields the same digits regardless of the
//! machine's locale or local zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Zone used when the configuration does not name one
pub const DEFAULT_TIMEZONE: &str = "America/Bogota";

const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Source of "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Wall clock
    System,
    /// Always the same instant
    Fixed(DateTime<Utc>),
}

impl Clock {
    fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(instant) => *instant,
        }
    }
}

/// Timestamp generator pinned to one timezone
#[derive(Debug, Clone)]
pub struct Stamper {
    tz: Tz,
    clock: Clock,
}

impl Stamper {
    /// Create a wall-clock stamper for the given zone
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            clock: Clock::System,
        }
    }

    /// Create a stamper from an IANA zone name such as `America/Bogota`
    pub fn from_zone_name(name: &str) -> Result<Self> {
        let tz = name
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(name.to_string()))?;
        Ok(Self::new(tz))
    }

    /// Replace the clock (tests pin the instant with `Clock::Fixed`)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Zone the stamper renders in
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Stamp for the current instant
    pub fn stamp(&self) -> String {
        self.stamp_at(self.clock.now())
    }

    /// Stamp for an explicit instant
    pub fn stamp_at(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format(STAMP_FORMAT).to_string()
    }
}

impl Default for Stamper {
    fn default() -> Self {
        Self::new(chrono_tz::America::Bogota)
    }
}
