use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

/// Shown for any absent or non-finite figure
pub const PLACEHOLDER: &str = "—";

const MM_PER_INCH: f64 = 25.4;
const SQ_M_PER_KM2: f64 = 1_000_000.0;
const SQ_M_PER_MI2: f64 = 2_589_988.110336;

/// Presentation unit system. Stored values are always metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitMode {
    #[default]
    Metric,
    Imperial,
}

impl UnitMode {
    pub fn toggled(self) -> Self {
        match self {
            UnitMode::Metric => UnitMode::Imperial,
            UnitMode::Imperial => UnitMode::Metric,
        }
    }

    /// Absolute temperature from °C
    pub fn temperature(self, c: f64) -> f64 {
        match self {
            UnitMode::Metric => c,
            UnitMode::Imperial => c_to_f(c),
        }
    }

    /// Temperature change from °C; never offset
    pub fn temperature_delta(self, c: f64) -> f64 {
        match self {
            UnitMode::Metric => c,
            UnitMode::Imperial => c_delta_to_f(c),
        }
    }

    /// Precipitation (or precipitation change) from mm
    pub fn precipitation(self, mm: f64) -> f64 {
        match self {
            UnitMode::Metric => mm,
            UnitMode::Imperial => mm_to_in(mm),
        }
    }

    pub fn temperature_unit(self) -> &'static str {
        match self {
            UnitMode::Metric => "°C",
            UnitMode::Imperial => "°F",
        }
    }

    pub fn precipitation_unit(self) -> &'static str {
        match self {
            UnitMode::Metric => "mm",
            UnitMode::Imperial => "in",
        }
    }
}

impl fmt::Display for UnitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnitMode::Metric => "metric",
            UnitMode::Imperial => "imperial",
        })
    }
}

impl FromStr for UnitMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "si" => Ok(UnitMode::Metric),
            "imperial" | "us" => Ok(UnitMode::Imperial),
            other => bail!("unknown unit mode {other:?}"),
        }
    }
}

pub fn c_to_f(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn f_to_c(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Per-decade (or any) temperature difference: scale only
pub fn c_delta_to_f(dc: f64) -> f64 {
    dc * 9.0 / 5.0
}

pub fn mm_to_in(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

pub fn in_to_mm(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

pub fn sq_m_to_km2(sq_m: f64) -> f64 {
    sq_m / SQ_M_PER_KM2
}

pub fn sq_m_to_mi2(sq_m: f64) -> f64 {
    sq_m / SQ_M_PER_MI2
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Fixed-precision number, or the placeholder
pub fn fmt_number(value: Option<f64>, digits: usize) -> String {
    match finite(value) {
        Some(v) => format!("{v:.digits$}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Like [`fmt_number`] but always carries a sign, for trends
pub fn fmt_signed(value: Option<f64>, digits: usize) -> String {
    match finite(value) {
        Some(v) => format!("{v:+.digits$}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Whole number with thousands separators
pub fn fmt_grouped(value: Option<f64>) -> String {
    let Some(v) = finite(value) else {
        return PLACEHOLDER.to_string();
    };
    let rounded = format!("{v:.0}");
    let (negative, digits) = match rounded.strip_prefix('-') {
        Some(digits) => (digits != "0", digits),
        None => (false, rounded.as_str()),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
