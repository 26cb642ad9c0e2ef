//! Timestamp packer.
//!
//! Wire form is an `Int64` count of microseconds since 0001-01-01T00:00:00
//! UTC (ordinal day 1 of the proleptic Gregorian calendar). Values are
//! normalized to UTC before encoding; decoding always yields UTC.

use std::borrow::Cow;
use std::io::{Read, Write};
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::builtin;
use crate::error::{type_mismatch, PackError, Result};
use crate::packer::Packer;
use crate::primitive::Int64;
use crate::value::Value;

/// Microseconds between 0001-01-01 and the Unix epoch (719162 days).
pub const UNIX_EPOCH_MICROS: i64 = 719_162 * 86_400 * 1_000_000;

static PROCESS_LOCAL_OFFSET: OnceLock<FixedOffset> = OnceLock::new();

/// The local UTC offset, sampled once per process on first use.
///
/// Naive timestamps are interpreted with this offset for the life of the
/// process, so a long-running process that crosses a daylight-saving
/// transition keeps using the offset it started with.
pub fn process_local_offset() -> FixedOffset {
    *PROCESS_LOCAL_OFFSET.get_or_init(|| {
        let offset = *Local::now().offset();
        debug!(%offset, "cached process local UTC offset");
        offset
    })
}

/// Anything the [`Date`] packer can normalize to UTC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateInput {
    /// Carries its own offset; the offset is subtracted.
    Aware(DateTime<FixedOffset>),
    /// No offset; assumed to be local time.
    Naive(NaiveDateTime),
    /// Whole seconds since the Unix epoch, already UTC.
    UnixSeconds(i64),
    /// Fractional seconds since the Unix epoch, rounded to microseconds.
    UnixSecondsFloat(f64),
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(dt: DateTime<Tz>) -> Self {
        DateInput::Aware(dt.fixed_offset())
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        DateInput::Naive(dt)
    }
}

impl From<i64> for DateInput {
    fn from(secs: i64) -> Self {
        DateInput::UnixSeconds(secs)
    }
}

impl From<f64> for DateInput {
    fn from(secs: f64) -> Self {
        DateInput::UnixSecondsFloat(secs)
    }
}

/// Timestamp packer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Date {
    local_offset: Option<FixedOffset>,
}

impl Date {
    pub const ID: i32 = builtin::DATE;

    /// A packer that reads naive timestamps with the cached process offset.
    pub const fn new() -> Self {
        Self { local_offset: None }
    }

    /// A packer that reads naive timestamps with an explicit offset.
    pub const fn with_local_offset(offset: FixedOffset) -> Self {
        Self {
            local_offset: Some(offset),
        }
    }

    /// The offset naive timestamps are assumed to carry.
    pub fn local_offset(&self) -> FixedOffset {
        self.local_offset.unwrap_or_else(process_local_offset)
    }

    /// Convert any supported input to a UTC timestamp.
    pub fn normalize(&self, input: impl Into<DateInput>) -> Result<DateTime<Utc>> {
        match input.into() {
            DateInput::Aware(dt) => Ok(dt.with_timezone(&Utc)),
            DateInput::Naive(naive) => self
                .local_offset()
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or(PackError::TypeMismatch {
                    expected: "representable local date",
                    found: "local date",
                }),
            DateInput::UnixSeconds(secs) => {
                DateTime::from_timestamp(secs, 0).ok_or(PackError::TypeMismatch {
                    expected: "unix seconds within date range",
                    found: "int64",
                })
            }
            DateInput::UnixSecondsFloat(secs) => {
                let micros = (secs * 1_000_000.0).round();
                if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
                    return Err(PackError::TypeMismatch {
                        expected: "finite unix seconds",
                        found: "float",
                    });
                }
                DateTime::from_timestamp_micros(micros as i64).ok_or(PackError::TypeMismatch {
                    expected: "unix seconds within date range",
                    found: "float",
                })
            }
        }
    }

    /// Normalize `input` and encode it.
    pub fn pack_input<W: Write + ?Sized>(
        &self,
        input: impl Into<DateInput>,
        writer: &mut W,
    ) -> Result<()> {
        let utc = self.normalize(input)?;
        self.pack(&utc, writer)
    }
}

impl Packer for Date {
    type Value = DateTime<Utc>;

    fn type_id(&self) -> i32 {
        Self::ID
    }

    fn pack<W: Write + ?Sized>(&self, value: &DateTime<Utc>, writer: &mut W) -> Result<()> {
        let micros = value
            .timestamp_micros()
            .checked_add(UNIX_EPOCH_MICROS)
            .ok_or(PackError::TypeMismatch {
                expected: "date within wire range",
                found: "date",
            })?;
        Int64.pack(&micros, writer)
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<DateTime<Utc>> {
        let micros = Int64.unpack(reader)?;
        micros
            .checked_sub(UNIX_EPOCH_MICROS)
            .and_then(DateTime::from_timestamp_micros)
            .ok_or_else(|| PackError::Decode(format!("timestamp {micros}us out of range")))
    }

    fn into_value(&self, value: DateTime<Utc>) -> Value {
        Value::Date(value.fixed_offset())
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, DateTime<Utc>>> {
        let input = match value {
            Value::Date(dt) => DateInput::Aware(*dt),
            Value::LocalDate(naive) => DateInput::Naive(*naive),
            Value::Float(secs) => DateInput::UnixSecondsFloat(*secs),
            other => match other.as_i64() {
                Some(secs) => DateInput::UnixSeconds(secs),
                None => return Err(type_mismatch("date", other)),
            },
        };
        self.normalize(input).map(Cow::Owned)
    }
}
