//! Unit strings at the input boundary.
//!
//! CLI flags and service responses carry values such as `0.01 ph/s` or
//! `1e8 ph / (s m2)`. A [`Measurement`] is such a value parsed into base units
//! together with the dimension it turned out to have. It exists only long enough
//! to be checked against the dimension a parameter needs and converted into the
//! matching typed quantity from [`crate::math::units`].
//!
//! Base units are photons (`ph`), metres (`m`), seconds (`s`) and radians (`rad`).
//!
//! ```text
//! ph/s          ph / (s m2)        ph m^-2 s^-1        m**2        arcsec
//! ```

use std::f64::consts::PI;
use std::fmt;

use thiserror::Error;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Time};
use uom::si::time::second;

use crate::error::EtcError;
use crate::math::units::{PhotonRate, PhotonRateExt, Photons, PhotonsExt};

const ARCSEC: f64 = PI / (180.0 * 3600.0);
const ARCMIN: f64 = PI / (180.0 * 60.0);
const DEGREE: f64 = PI / 180.0;

/// Integer exponents of the base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimension {
    pub photon: i8,
    pub length: i8,
    pub time: i8,
    pub angle: i8,
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension::new(0, 0, 0, 0);
    pub const PHOTON: Dimension = Dimension::new(1, 0, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(0, 1, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0);
    pub const ANGLE: Dimension = Dimension::new(0, 0, 0, 1);
    /// Photon count per unit time (dark current).
    pub const PHOTON_RATE: Dimension = Dimension::new(1, 0, -1, 0);
    /// Photon count per unit area per unit time.
    pub const PHOTON_FLUX: Dimension = Dimension::new(1, -2, -1, 0);

    pub const fn new(photon: i8, length: i8, time: i8, angle: i8) -> Self {
        Self {
            photon,
            length,
            time,
            angle,
        }
    }

    pub fn is_dimensionless(self) -> bool {
        self == Self::DIMENSIONLESS
    }

    fn zip(self, rhs: Dimension, op: fn(i8, i8) -> Option<i8>) -> Option<Dimension> {
        Some(Dimension::new(
            op(self.photon, rhs.photon)?,
            op(self.length, rhs.length)?,
            op(self.time, rhs.time)?,
            op(self.angle, rhs.angle)?,
        ))
    }

    /// Dimension of a product; `None` if an exponent overflows.
    pub fn checked_mul(self, rhs: Dimension) -> Option<Dimension> {
        self.zip(rhs, i8::checked_add)
    }

    /// Dimension of a quotient; `None` if an exponent overflows.
    pub fn checked_div(self, rhs: Dimension) -> Option<Dimension> {
        self.zip(rhs, i8::checked_sub)
    }

    pub fn checked_powi(self, n: i8) -> Option<Dimension> {
        Some(Dimension::new(
            self.photon.checked_mul(n)?,
            self.length.checked_mul(n)?,
            self.time.checked_mul(n)?,
            self.angle.checked_mul(n)?,
        ))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("ph", self.photon),
            ("m", self.length),
            ("s", self.time),
            ("rad", self.angle),
        ]
        .iter()
        .filter(|(_, exp)| *exp != 0)
        .map(|(sym, exp)| match *exp {
            1 => (*sym).to_string(),
            _ => format!("{sym}{exp}"),
        })
        .collect();

        if parts.is_empty() {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

/// Unit string failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UnitError {
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },
}

/// A scale factor to base units plus the dimension it carries.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Unit {
    factor: f64,
    dim: Dimension,
}

const NAMED_UNITS: &[(&str, f64, Dimension)] = &[
    ("ph", 1.0, Dimension::PHOTON),
    ("photon", 1.0, Dimension::PHOTON),
    ("photons", 1.0, Dimension::PHOTON),
    ("m", 1.0, Dimension::LENGTH),
    ("km", 1e3, Dimension::LENGTH),
    ("cm", 1e-2, Dimension::LENGTH),
    ("mm", 1e-3, Dimension::LENGTH),
    ("um", 1e-6, Dimension::LENGTH),
    ("nm", 1e-9, Dimension::LENGTH),
    ("s", 1.0, Dimension::TIME),
    ("sec", 1.0, Dimension::TIME),
    ("second", 1.0, Dimension::TIME),
    ("seconds", 1.0, Dimension::TIME),
    ("ms", 1e-3, Dimension::TIME),
    ("min", 60.0, Dimension::TIME),
    ("h", 3600.0, Dimension::TIME),
    ("hr", 3600.0, Dimension::TIME),
    ("rad", 1.0, Dimension::ANGLE),
    ("deg", DEGREE, Dimension::ANGLE),
    ("arcmin", ARCMIN, Dimension::ANGLE),
    ("arcsec", ARCSEC, Dimension::ANGLE),
    ("mas", ARCSEC * 1e-3, Dimension::ANGLE),
];

impl Unit {
    const ONE: Unit = Unit {
        factor: 1.0,
        dim: Dimension::DIMENSIONLESS,
    };

    fn named(name: &str) -> Result<Unit, UnitError> {
        NAMED_UNITS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|&(_, factor, dim)| Unit { factor, dim })
            .ok_or_else(|| UnitError::UnknownUnit(name.to_string()))
    }

    fn powi(self, n: i8) -> Option<Unit> {
        Some(Unit {
            factor: self.factor.powi(i32::from(n)),
            dim: self.dim.checked_powi(n)?,
        })
    }

    fn times(self, rhs: Unit) -> Option<Unit> {
        Some(Unit {
            factor: self.factor * rhs.factor,
            dim: self.dim.checked_mul(rhs.dim)?,
        })
    }

    fn over(self, rhs: Unit) -> Option<Unit> {
        Some(Unit {
            factor: self.factor / rhs.factor,
            dim: self.dim.checked_div(rhs.dim)?,
        })
    }

    /// Parse a unit expression such as `ph / (s m2)`.
    ///
    /// An empty string (or `dimensionless`) is the unit scalar.
    fn parse(input: &str) -> Result<Unit, UnitError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "dimensionless" {
            return Ok(Unit::ONE);
        }

        let tokens = tokenize(trimmed)?;
        let mut parser = UnitParser {
            input: trimmed,
            tokens: &tokens,
            pos: 0,
        };
        let unit = parser.product()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String, i8),
    Scalar(f64),
    Exponent(i8),
    Star,
    Slash,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, UnitError> {
    let parse_err = |reason: String| UnitError::Parse {
        input: input.to_string(),
        reason,
    };

    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    // Consumes an optionally signed run of digits starting at `i` and returns it
    // as an `i8`; `None` if there are no digits, an error if it does not fit.
    let read_int = |i: &mut usize| -> Result<Option<i8>, UnitError> {
        let start = *i;
        if matches!(chars.get(*i), Some('-' | '+')) {
            *i += 1;
        }
        let digits_start = *i;
        while chars.get(*i).is_some_and(|c| c.is_ascii_digit()) {
            *i += 1;
        }
        if *i == digits_start {
            *i = start;
            return Ok(None);
        }
        let text: String = chars[start..*i].iter().collect();
        text.parse::<i8>()
            .map(Some)
            .map_err(|_| parse_err(format!("exponent '{text}' is out of range")))
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                let exp = read_int(&mut i)?.ok_or_else(|| parse_err("expected exponent after '**'".into()))?;
                tokens.push(Token::Exponent(exp));
            }
            '^' => {
                i += 1;
                let exp = read_int(&mut i)?.ok_or_else(|| parse_err("expected exponent after '^'".into()))?;
                tokens.push(Token::Exponent(exp));
            }
            '*' | '.' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while chars.get(i).is_some_and(|c| c.is_ascii_alphabetic()) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                // `m2`, `s-1`: digits glued to a name are its exponent.
                let attached = match chars.get(i).copied() {
                    Some(d) if d.is_ascii_digit() => read_int(&mut i)?,
                    Some('-' | '+') if chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => read_int(&mut i)?,
                    _ => None,
                };
                tokens.push(Token::Name(name, attached.unwrap_or(1)));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while chars.get(i).is_some_and(|c| c.is_ascii_digit() || *c == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value: f64 = text
                    .parse()
                    .map_err(|_| parse_err(format!("invalid numeric factor '{text}'")))?;
                tokens.push(Token::Scalar(value));
            }
            _ => return Err(parse_err(format!("unexpected character '{c}'"))),
        }
    }

    Ok(tokens)
}

struct UnitParser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl UnitParser<'_> {
    fn error(&self, reason: &str) -> UnitError {
        UnitError::Parse {
            input: self.input.to_string(),
            reason: reason.to_string(),
        }
    }

    fn overflow(&self) -> UnitError {
        self.error("dimension exponent is out of range")
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    // product := factor ( ('*' | '/' | <adjacent>) factor )*
    //
    // '/' divides by the next factor only, so `ph/m2/s` reads as ph m-2 s-1.
    fn product(&mut self) -> Result<Unit, UnitError> {
        let mut acc = self.factor()?;
        loop {
            let next = match self.peek() {
                None | Some(Token::Close) => return Ok(acc),
                Some(Token::Star) => {
                    self.pos += 1;
                    acc.times(self.factor()?)
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    acc.over(self.factor()?)
                }
                Some(_) => acc.times(self.factor()?),
            };
            acc = next.ok_or_else(|| self.overflow())?;
        }
    }

    // factor := primary exponent?
    fn factor(&mut self) -> Result<Unit, UnitError> {
        let base = self.primary()?;
        if let Some(Token::Exponent(n)) = self.peek() {
            let n = *n;
            self.pos += 1;
            return base.powi(n).ok_or_else(|| self.overflow());
        }
        Ok(base)
    }

    // primary := name | scalar | '(' product ')'
    fn primary(&mut self) -> Result<Unit, UnitError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of unit expression"))?;
        self.pos += 1;
        match token {
            Token::Name(name, exp) => Unit::named(name)?.powi(*exp).ok_or_else(|| self.overflow()),
            Token::Scalar(v) => Ok(Unit {
                factor: *v,
                dim: Dimension::DIMENSIONLESS,
            }),
            Token::Open => {
                let inner = self.product()?;
                match self.peek() {
                    Some(Token::Close) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(self.error("unbalanced parenthesis")),
                }
            }
            _ => Err(self.error("expected a unit name")),
        }
    }
}

/// A parsed value in base units, tagged with the dimension of its unit string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    value: f64,
    dim: Dimension,
}

impl Measurement {
    /// Build a measurement from a value expressed in `unit`.
    pub fn with_unit(value: f64, unit: &str) -> Result<Self, UnitError> {
        let unit = Unit::parse(unit)?;
        Ok(Self {
            value: value * unit.factor,
            dim: unit.dim,
        })
    }

    /// Parse `"<number> <unit>"`, e.g. `0.01 ph/s` or `0.6arcsec`.
    pub fn parse(input: &str) -> Result<Self, UnitError> {
        let trimmed = input.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);
        if number.is_empty() {
            return Err(UnitError::Parse {
                input: input.to_string(),
                reason: "missing numeric value".to_string(),
            });
        }
        let value: f64 = number.parse().map_err(|_| UnitError::Parse {
            input: input.to_string(),
            reason: format!("invalid number '{number}'"),
        })?;
        Self::with_unit(value, unit)
    }

    /// Value in base units.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn dim(&self) -> Dimension {
        self.dim
    }

    fn require(&self, parameter: &'static str, expected: Dimension) -> Result<f64, EtcError> {
        if self.dim != expected {
            return Err(EtcError::IncompatibleUnits {
                parameter,
                expected,
                found: self.dim,
            });
        }
        Ok(self.value)
    }

    pub fn into_photon_rate(self, parameter: &'static str) -> Result<PhotonRate, EtcError> {
        Ok(PhotonRate::from_photons_per_second(
            self.require(parameter, Dimension::PHOTON_RATE)?,
        ))
    }

    pub fn into_photons(self, parameter: &'static str) -> Result<Photons, EtcError> {
        Ok(Photons::from_photons(self.require(parameter, Dimension::PHOTON)?))
    }

    pub fn into_angle(self, parameter: &'static str) -> Result<Angle, EtcError> {
        Ok(Angle::new::<radian>(self.require(parameter, Dimension::ANGLE)?))
    }

    pub fn into_time(self, parameter: &'static str) -> Result<Time, EtcError> {
        Ok(Time::new::<second>(self.require(parameter, Dimension::TIME)?))
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dim.is_dimensionless() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.dim)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::units::AngleExt;

    fn rel_close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs().max(f64::MIN_POSITIVE)
    }

    #[test]
    fn parses_common_detector_units() {
        let dark = Measurement::parse("0.01 ph/s").unwrap();
        assert_eq!(dark.dim(), Dimension::PHOTON_RATE);
        assert!(rel_close(dark.value(), 0.01, 1e-12));

        let seeing = Measurement::parse("0.6 arcsec").unwrap();
        assert_eq!(seeing.dim(), Dimension::ANGLE);
        let angle = seeing.into_angle("seeing").unwrap();
        assert!(rel_close(angle.as_arcseconds(), 0.6, 1e-12));

        let compact = Measurement::parse("0.6arcsec").unwrap();
        assert!(rel_close(compact.value(), seeing.value(), 1e-12));

        let dit = Measurement::parse("3 min").unwrap();
        assert!(rel_close(dit.value(), 180.0, 1e-12));
    }

    #[test]
    fn parses_flux_unit_spellings() {
        for unit in ["ph / (s m2)", "ph/m2/s", "ph m^-2 s^-1", "ph m-2 s-1", "ph/(m**2*s)"] {
            let q = Measurement::with_unit(1e8, unit).unwrap();
            assert_eq!(q.dim(), Dimension::PHOTON_FLUX, "unit {unit}");
            assert!(rel_close(q.value(), 1e8, 1e-12), "unit {unit}");
        }

        let per_cm2 = Measurement::with_unit(1.0, "ph/(s cm2)").unwrap();
        assert!(rel_close(per_cm2.value(), 1e4, 1e-12));
    }

    #[test]
    fn bare_number_is_dimensionless() {
        let q = Measurement::parse("0.01").unwrap();
        assert!(q.dim().is_dimensionless());
        assert_eq!(
            q.into_photon_rate("dark"),
            Err(EtcError::IncompatibleUnits {
                parameter: "dark",
                expected: Dimension::PHOTON_RATE,
                found: Dimension::DIMENSIONLESS,
            })
        );
    }

    #[test]
    fn conversions_check_dimension() {
        let readout = Measurement::parse("5 ph").unwrap();
        assert!(readout.into_photons("readout").is_ok());
        assert!(matches!(
            readout.into_time("dit"),
            Err(EtcError::IncompatibleUnits { parameter: "dit", .. })
        ));

        let dit = Measurement::parse("1 h").unwrap().into_time("dit").unwrap();
        assert!(rel_close(dit.get::<second>(), 3600.0, 1e-12));
    }

    #[test]
    fn rejects_unknown_units_and_garbage() {
        assert_eq!(
            Measurement::parse("5 parsec"),
            Err(UnitError::UnknownUnit("parsec".to_string()))
        );
        assert!(matches!(Measurement::parse("ph"), Err(UnitError::Parse { .. })));
        assert!(matches!(Unit::parse("ph/(s m2"), Err(UnitError::Parse { .. })));
        assert!(matches!(Unit::parse("m^"), Err(UnitError::Parse { .. })));
    }

    #[test]
    fn exponent_overflow_is_a_parse_error() {
        for input in ["1 m2^100", "1 m^127 m", "1 ph/(s^100 s^100)"] {
            assert!(
                matches!(Measurement::parse(input), Err(UnitError::Parse { .. })),
                "{input}"
            );
        }
        assert!(matches!(
            Measurement::with_unit(1.0, "ph m100 m100"),
            Err(UnitError::Parse { .. })
        ));
        assert!(matches!(Measurement::parse("1 m^-128"), Ok(_)));
    }

    #[test]
    fn oversized_attached_exponent_is_not_dropped() {
        assert!(matches!(Measurement::parse("3600 s999"), Err(UnitError::Parse { .. })));
        assert!(matches!(Measurement::parse("1 m^300"), Err(UnitError::Parse { .. })));
        assert_eq!(Measurement::parse("2 s2").unwrap().dim(), Dimension::new(0, 0, 2, 0));
    }

    #[test]
    fn display_lists_nonzero_exponents() {
        assert_eq!(Dimension::PHOTON_FLUX.to_string(), "ph m-2 s-1");
        assert_eq!(Dimension::DIMENSIONLESS.to_string(), "dimensionless");
        assert_eq!(Measurement::parse("5 ph").unwrap().to_string(), "5 ph");
    }

    #[test]
    fn dimension_arithmetic_is_checked() {
        assert_eq!(
            Dimension::PHOTON.checked_div(Dimension::TIME),
            Some(Dimension::PHOTON_RATE)
        );
        assert_eq!(Dimension::new(0, 100, 0, 0).checked_mul(Dimension::new(0, 100, 0, 0)), None);
        assert_eq!(Dimension::new(0, -100, 0, 0).checked_div(Dimension::new(0, 100, 0, 0)), None);
        assert_eq!(Dimension::LENGTH.checked_powi(2), Some(Dimension::new(0, 2, 0, 0)));
        assert_eq!(Dimension::new(0, 2, 0, 0).checked_powi(100), None);
    }
}
