use std::fmt;
use std::num::IntErrorKind;
use thiserror::Error;

/// Numeric type a datalog cell is parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    U8,
    U16,
    F64,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::U8 => write!(f, "u8"),
            CellKind::U16 => write!(f, "u16"),
            CellKind::F64 => write!(f, "f64"),
        }
    }
}

/// A parsed cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    U8(u8),
    U16(u16),
    F64(f64),
}

impl CellValue {
    /// The substitute used when a cell fails to parse
    pub fn zero(kind: CellKind) -> Self {
        match kind {
            CellKind::U8 => CellValue::U8(0),
            CellKind::U16 => CellValue::U16(0),
            CellKind::F64 => CellValue::F64(0.0),
        }
    }

    /// Read as u8, narrowing wider values with the truncate-and-wrap policy
    pub fn as_u8(self) -> u8 {
        match self {
            CellValue::U8(v) => v,
            CellValue::U16(v) => v as u8,
            CellValue::F64(v) => truncate_wrapping_u8(v),
        }
    }

    /// Read as u16, narrowing floats with the truncate-and-wrap policy
    pub fn as_u16(self) -> u16 {
        match self {
            CellValue::U8(v) => u16::from(v),
            CellValue::U16(v) => v,
            CellValue::F64(v) => truncate_wrapping_u16(v),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            CellValue::U8(v) => f64::from(v),
            CellValue::U16(v) => f64::from(v),
            CellValue::F64(v) => v,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("'{cell}' is not a base-10 {kind}")]
    InvalidInteger { cell: String, kind: CellKind },

    #[error("'{cell}' is out of range for {kind}")]
    OutOfRange { cell: String, kind: CellKind },

    #[error("'{cell}' is not a decimal number")]
    InvalidFloat { cell: String },
}

/// Parse one datalog cell as `kind`
///
/// Integers are plain base-10 digits; a sign or any other character is
/// rejected, as are values wider than the target type. Floats accept the
/// usual decimal and exponent syntax.
pub fn parse_cell(cell: &str, kind: CellKind) -> Result<CellValue, ConvertError> {
    match kind {
        CellKind::U8 => parse_unsigned::<u8>(cell, kind).map(CellValue::U8),
        CellKind::U16 => parse_unsigned::<u16>(cell, kind).map(CellValue::U16),
        CellKind::F64 => cell
            .parse::<f64>()
            .map(CellValue::F64)
            .map_err(|_| ConvertError::InvalidFloat {
                cell: cell.to_string(),
            }),
    }
}

fn parse_unsigned<T>(cell: &str, kind: CellKind) -> Result<T, ConvertError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    if !cell.bytes().next().is_some_and(|b| b.is_ascii_digit()) {
        return Err(ConvertError::InvalidInteger {
            cell: cell.to_string(),
            kind,
        });
    }

    cell.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ConvertError::OutOfRange {
            cell: cell.to_string(),
            kind,
        },
        _ => ConvertError::InvalidInteger {
            cell: cell.to_string(),
            kind,
        },
    })
}

/// Narrow a float to u16: truncate toward zero, then keep the low 16 bits.
///
/// Receivers of the emulated ECU frames expect exactly this loss, so there is
/// no rounding and no saturation. NaN becomes 0.
pub fn truncate_wrapping_u16(value: f64) -> u16 {
    (value as i64) as u16
}

/// Narrow a float to u8 with the same policy as [`truncate_wrapping_u16`]
pub fn truncate_wrapping_u8(value: f64) -> u8 {
    (value as i64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse_cell("5000", CellKind::U16), Ok(CellValue::U16(5000)));
        assert_eq!(parse_cell("255", CellKind::U8), Ok(CellValue::U8(255)));
        assert_eq!(parse_cell("007", CellKind::U8), Ok(CellValue::U8(7)));
    }

    #[test]
    fn test_integer_range_is_strict() {
        assert!(matches!(
            parse_cell("256", CellKind::U8),
            Err(ConvertError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_cell("65536", CellKind::U16),
            Err(ConvertError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_malformed_integers() {
        for cell in ["abc", "", "+5", "-1", "1.5", " 12", "0x10"] {
            assert!(
                matches!(
                    parse_cell(cell, CellKind::U16),
                    Err(ConvertError::InvalidInteger { .. })
                ),
                "{:?} should be rejected",
                cell
            );
        }
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(parse_cell("13.8", CellKind::F64), Ok(CellValue::F64(13.8)));
        assert_eq!(parse_cell("-33.5", CellKind::F64), Ok(CellValue::F64(-33.5)));
        assert_eq!(parse_cell("1e3", CellKind::F64), Ok(CellValue::F64(1000.0)));
        assert_eq!(
            parse_cell("1,5", CellKind::F64),
            Err(ConvertError::InvalidFloat { cell: "1,5".to_string() })
        );
    }

    #[test]
    fn test_truncation_is_toward_zero() {
        assert_eq!(truncate_wrapping_u16(14.99), 14);
        assert_eq!(truncate_wrapping_u16(0.7), 0);
        assert_eq!(truncate_wrapping_u8(13.8), 13);
    }

    #[test]
    fn test_truncation_wraps_instead_of_saturating() {
        assert_eq!(truncate_wrapping_u16(-1.5), u16::MAX);
        assert_eq!(truncate_wrapping_u16(-10.0), 65526);
        assert_eq!(truncate_wrapping_u16(65537.9), 1);
        assert_eq!(truncate_wrapping_u8(256.0), 0);
        assert_eq!(truncate_wrapping_u8(-2.2), 254);
        assert_eq!(truncate_wrapping_u16(f64::NAN), 0);
    }

    #[test]
    fn test_cell_value_widening_and_narrowing() {
        assert_eq!(CellValue::U8(200).as_u16(), 200);
        assert_eq!(CellValue::F64(13.8).as_u8(), 13);
        assert_eq!(CellValue::F64(1.02).as_u16(), 1);
        assert_eq!(CellValue::U16(300).as_f64(), 300.0);
        assert_eq!(CellValue::zero(CellKind::F64), CellValue::F64(0.0));
    }
}
