//! Sexagesimal angle parsing and formatting, plus wrapping of decimal angles
//! into a fixed 360° window.


use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub use super::error::AngleParseError;

/// The unit of the leading sexagesimal component.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    /// Hour angle; 1h = 15°.
    #[strum(to_string = "hours", serialize = "hourangle", serialize = "h")]
    Hours,

    #[strum(to_string = "degrees", serialize = "deg", serialize = "d")]
    Degrees,
}

impl AngleUnit {
    /// Convert a decimal value in this unit to degrees.
    pub fn to_degrees(self, value: f64) -> f64 {
        match self {
            AngleUnit::Hours => value * 15.0,
            AngleUnit::Degrees => value,
        }
    }

    /// Convert a value in degrees to this unit.
    pub fn degrees_to_unit(self, degrees: f64) -> f64 {
        match self {
            AngleUnit::Hours => degrees / 15.0,
            AngleUnit::Degrees => degrees,
        }
    }

    /// The size of a full turn in this unit.
    fn full_turn(self) -> f64 {
        match self {
            AngleUnit::Hours => 24.0,
            AngleUnit::Degrees => 360.0,
        }
    }
}

/// Most seconds digits [`format_sexagesimal`] will print. A full turn in
/// units of 1e-9 seconds still fits exactly in an f64 mantissa.
pub const MAX_DECIMALS: usize = 9;

/// Parse a sexagesimal string ("17:51:00.0", "-29 59 48") into decimal
/// \[degrees\]. Components may be separated by colons or whitespace.
///
/// The sign comes from the single explicitly-signed component, so
/// "-00:04:02.84" is negative even though its leading component is zero.
///
/// # Examples
///
/// ```
/// # use rusty_catalog::data::angle::*;
/// # use approx::*;
/// # fn main() -> Result<(), AngleParseError> {
/// let ra = parse_sexagesimal("17:51:00.0", AngleUnit::Hours)?;
/// assert_abs_diff_eq!(ra, 267.75, epsilon = 1e-9);
/// # Ok(())
/// # }
/// ```
pub fn parse_sexagesimal(text: &str, unit: AngleUnit) -> Result<f64, AngleParseError> {
    let fields: Vec<&str> = text
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect();
    if fields.len() != 3 {
        return Err(AngleParseError::WrongComponentCount {
            input: text.to_string(),
            found: fields.len(),
        });
    }

    let mut negative: Option<bool> = None;
    let mut parts = [0.0; 3];
    for (part, field) in parts.iter_mut().zip(&fields) {
        let explicit_sign = match field.chars().next() {
            Some('-') => Some(true),
            Some('+') => Some(false),
            _ => None,
        };
        if let Some(sign) = explicit_sign {
            if negative.replace(sign).is_some() {
                return Err(AngleParseError::ConflictingSigns(text.to_string()));
            }
        }

        let value: f64 = field
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| AngleParseError::NotANumber {
                input: text.to_string(),
                component: field.to_string(),
            })?;
        *part = value.abs();
    }

    for (which, value) in [("minutes", parts[1]), ("seconds", parts[2])] {
        if value >= 60.0 {
            return Err(AngleParseError::OutOfRange {
                input: text.to_string(),
                which,
                value,
            });
        }
    }

    let magnitude = parts[0] + parts[1] / 60.0 + parts[2] / 3600.0;
    let value = if negative.unwrap_or(false) {
        -magnitude
    } else {
        magnitude
    };
    Ok(unit.to_degrees(value))
}

/// Format an angle in \[degrees\] as `[-]AA:MM:SS.s…` in the given unit, with
/// `decimals` digits after the seconds' decimal point, capped at
/// [`MAX_DECIMALS`]. Carries are resolved, so 59.99999s never prints as
/// "60.0". Magnitudes of a full turn or more are reduced modulo the turn
/// (360° or 24h) before formatting.
///
/// # Examples
///
/// ```
/// # use rusty_catalog::data::angle::*;
/// assert_eq!(format_sexagesimal(267.75, AngleUnit::Hours, 1), "17:51:00.0");
/// assert_eq!(format_sexagesimal(-29.996667, AngleUnit::Degrees, 0), "-29:59:48");
/// ```
pub fn format_sexagesimal(degrees: f64, unit: AngleUnit, decimals: usize) -> String {
    if !degrees.is_finite() {
        return degrees.to_string();
    }
    let decimals = decimals.min(MAX_DECIMALS);
    let value = unit.degrees_to_unit(degrees);
    let magnitude = value.abs() % unit.full_turn();
    let scale = 10_u64.pow(decimals as u32);

    // Everything in units of 1/scale seconds.
    let total = (magnitude * 3600.0 * scale as f64).round() as u64;
    let per_minute = 60 * scale;
    let sub_minute = total % per_minute;
    let minutes_total = total / per_minute;
    let (lead, minutes) = (minutes_total / 60, minutes_total % 60);
    let seconds = sub_minute as f64 / scale as f64;

    let sign = if value < 0.0 && total > 0 { "-" } else { "" };
    let width = if decimals == 0 { 2 } else { decimals + 3 };
    format!("{sign}{lead:02}:{minutes:02}:{seconds:0width$.decimals$}")
}

/// Wrap an angle in \[degrees\] into `[wrap_at - 360, wrap_at)`.
///
/// Angles already in the window are returned untouched, which makes the
/// operation exactly idempotent.
pub fn wrap_angle(angle: f64, wrap_at: f64) -> f64 {
    let lower = wrap_at - 360.0;
    if (lower..wrap_at).contains(&angle) {
        return angle;
    }
    let mut offset = (angle - lower).rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs.
    if offset >= 360.0 {
        offset = 0.0;
    }
    let wrapped = offset + lower;
    if wrapped >= wrap_at {
        lower
    } else {
        wrapped
    }
}
