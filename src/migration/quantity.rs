//! Kubernetes resource quantities and the summing merge of resource requirements.
//!
//! Quantities are held as signed nano-units so that CPU millicores and memory byte
//! counts add up exactly. Precision below one nano-unit is rounded up, matching how
//! the API server treats over-precise values.

use super::diagnostics::Diagnostics;
use super::tree::{is_present, kind_of};
use serde_json::{Map as JsonMap, Value};
use std::fmt;
use thiserror::Error;

const NANOS_PER_UNIT: i128 = 1_000_000_000;

const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ki", 1),
    ("Mi", 2),
    ("Gi", 3),
    ("Ti", 4),
    ("Pi", 5),
    ("Ei", 6),
];

const DECIMAL_SUFFIXES: [(&str, i32); 10] = [
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("", 0),
    ("m", -3),
    ("u", -6),
    ("n", -9),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity {0:?}")]
    Invalid(String),

    #[error("quantity {0:?} is out of range")]
    OutOfRange(String),

    #[error("quantity must be a string or a number, found {0}")]
    NotAQuantity(&'static str),

    #[error("quantity sum overflows")]
    Overflow,
}

/// How a quantity was written, reused when rendering sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    BinarySi,
    DecimalSi,
    DecimalExponent,
}

#[derive(Debug, Clone, Copy)]
pub struct Quantity {
    nanos: i128,
    format: Format,
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// Rounds toward positive infinity.
fn div_ceil(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && a > 0 {
        q + 1
    } else {
        q
    }
}

impl Quantity {
    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }
        let invalid = || QuantityError::Invalid(input.to_string());
        let out_of_range = || QuantityError::OutOfRange(input.to_string());

        let (negative, rest) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(invalid());
        }

        let mut mantissa: i128 = 0;
        for digit in whole.chars().chain(fraction.chars()) {
            let d = i128::from(digit.to_digit(10).ok_or_else(invalid)?);
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(d))
                .ok_or_else(out_of_range)?;
        }
        let fraction_digits = u32::try_from(fraction.len()).map_err(|_| out_of_range())?;
        let scale = pow10(fraction_digits).ok_or_else(out_of_range)?;

        let (format, multiplier, exponent) = Self::parse_suffix(suffix).ok_or_else(invalid)?;

        // value = mantissa / scale * multiplier * 10^exponent, held in nanos
        let numerator = mantissa
            .checked_mul(multiplier)
            .and_then(|n| n.checked_mul(NANOS_PER_UNIT))
            .ok_or_else(out_of_range)?;
        let nanos = if exponent >= 0 {
            let factor = pow10(exponent.unsigned_abs()).ok_or_else(out_of_range)?;
            div_ceil(numerator.checked_mul(factor).ok_or_else(out_of_range)?, scale)
        } else {
            let divisor = pow10(exponent.unsigned_abs())
                .and_then(|d| d.checked_mul(scale))
                .ok_or_else(out_of_range)?;
            div_ceil(numerator, divisor)
        };

        Ok(Self {
            nanos: if negative { -nanos } else { nanos },
            format,
        })
    }

    /// Returns `(format, multiplier, decimal exponent)` for a suffix.
    fn parse_suffix(suffix: &str) -> Option<(Format, i128, i32)> {
        if let Some((_, power)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
            return Some((Format::BinarySi, 1024i128.pow(*power), 0));
        }
        if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
            return Some((Format::DecimalSi, 1, *exp));
        }
        let exponent = suffix.strip_prefix(['e', 'E'])?;
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let exp: i32 = exponent.parse().ok()?;
        Some((Format::DecimalExponent, 1, exp))
    }

    /// Reads a quantity written either as a YAML string or a bare number.
    pub fn from_value(value: &Value) -> Result<Self, QuantityError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => Self::parse(&n.to_string()),
            other => Err(QuantityError::NotAQuantity(kind_of(other))),
        }
    }

    /// Adds two quantities. The result keeps the format of the first non-zero operand.
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        let nanos = self
            .nanos
            .checked_add(other.nanos)
            .ok_or(QuantityError::Overflow)?;
        let format = if self.is_zero() {
            other.format
        } else {
            self.format
        };
        Ok(Self { nanos, format })
    }

    fn fmt_binary(&self, f: &mut fmt::Formatter<'_>) -> Option<fmt::Result> {
        if self.nanos % NANOS_PER_UNIT != 0 {
            return None;
        }
        let units = self.nanos / NANOS_PER_UNIT;
        for (suffix, power) in BINARY_SUFFIXES.iter().rev() {
            let base = 1024i128.pow(*power);
            if units % base == 0 {
                return Some(write!(f, "{}{}", units / base, suffix));
            }
        }
        Some(write!(f, "{units}"))
    }

    fn fmt_decimal(&self, f: &mut fmt::Formatter<'_>, exponent_form: bool) -> fmt::Result {
        for (suffix, exp) in DECIMAL_SUFFIXES {
            let Some(divisor) = pow10((exp + 9).unsigned_abs()) else {
                continue;
            };
            if self.nanos % divisor != 0 {
                continue;
            }
            let value = self.nanos / divisor;
            return if !exponent_form || exp == 0 {
                write!(f, "{value}{suffix}")
            } else {
                write!(f, "{value}e{exp}")
            };
        }
        write!(f, "{}n", self.nanos)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.write_str("0");
        }
        match self.format {
            Format::BinarySi => match self.fmt_binary(f) {
                Some(result) => result,
                None => self.fmt_decimal(f, false),
            },
            Format::DecimalSi => self.fmt_decimal(f, false),
            Format::DecimalExponent => self.fmt_decimal(f, true),
        }
    }
}

fn present(map: Option<&JsonMap<String, Value>>, key: &str) -> Option<Value> {
    map.and_then(|m| m.get(key)).filter(|v| is_present(v)).cloned()
}

fn as_section<'a>(
    value: Option<&'a Value>,
    path: &str,
    diags: &mut Diagnostics,
) -> Option<&'a JsonMap<String, Value>> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            diags.error(path, format!("expected a map, found {}; ignored", kind_of(other)));
            None
        }
    }
}

fn union_keys<'a>(
    first: Option<&'a JsonMap<String, Value>>,
    second: Option<&'a JsonMap<String, Value>>,
) -> Vec<&'a String> {
    let mut keys: Vec<&String> = first.map(|m| m.keys().collect()).unwrap_or_default();
    if let Some(second) = second {
        for key in second.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys
}

/// Sums two quantity maps (e.g. `requests`) name by name. A name missing on one side
/// contributes zero, so its other value is carried over untouched.
fn sum_quantity_maps(
    first: Option<&JsonMap<String, Value>>,
    second: Option<&JsonMap<String, Value>>,
    path: &str,
    diags: &mut Diagnostics,
) -> JsonMap<String, Value> {
    let mut out = JsonMap::new();
    for name in union_keys(first, second) {
        let a = present(first, name);
        let b = present(second, name);
        let merged = match (a, b) {
            (Some(a), Some(b)) => {
                let sum = Quantity::from_value(&a)
                    .and_then(|qa| Quantity::from_value(&b).and_then(|qb| qa.checked_add(qb)));
                match sum {
                    Ok(q) => Some(Value::String(q.to_string())),
                    Err(e) => {
                        diags.error(
                            format!("{path}.{name}"),
                            format!("cannot sum quantities: {e}; keeping the backend value"),
                        );
                        Some(b)
                    }
                }
            }
            (a, b) => b.or(a),
        };
        if let Some(v) = merged {
            out.insert(name.clone(), v);
        }
    }
    out
}

/// Merges two resource requirement blocks by summing `requests` and `limits`.
/// Any other key follows backend-wins precedence.
pub fn merge_resources(
    api: Option<&Value>,
    backend: Option<&Value>,
    path: &str,
    diags: &mut Diagnostics,
) -> JsonMap<String, Value> {
    let api = as_section(api, &format!("{path} (api)"), diags);
    let backend = as_section(backend, &format!("{path} (backend)"), diags);

    let mut out = JsonMap::new();
    for key in union_keys(api, backend) {
        let section_path = format!("{path}.{key}");
        if key == "requests" || key == "limits" {
            let a = as_section(api.and_then(|m| m.get(key)), &section_path, diags);
            let b = as_section(backend.and_then(|m| m.get(key)), &section_path, diags);
            let summed = sum_quantity_maps(a, b, &section_path, diags);
            if !summed.is_empty() {
                out.insert(key.clone(), Value::Object(summed));
            }
        } else if let Some(v) = present(backend, key).or_else(|| present(api, key)) {
            out.insert(key.clone(), v);
        }
    }
    out
}
