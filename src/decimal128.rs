//! [BSON Decimal128](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.md) data type representation

use std::fmt;

/// Struct representing a BSON Decimal128 type.
///
/// The bytes are stored in BSON (little-endian) order and copied out of the
/// input buffer on decode, so the value never aliases the buffer it was
/// parsed from.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    /// BSON bytes containing the decimal128. Stored for round tripping.
    pub(crate) bytes: [u8; 16],
}

impl Decimal128 {
    /// Constructs a new `Decimal128` from the provided raw byte representation.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Returns the raw byte representation of this `Decimal128`.
    pub const fn bytes(&self) -> [u8; 16] {
        self.bytes
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Decimal128(\"{}\")", ParsedDecimal128::new(self))
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", ParsedDecimal128::new(self))
    }
}

const EXPONENT_BIAS: i32 = 6176;
const MAX_COEFFICIENT: u128 = 10u128.pow(34) - 1;

/// The fields of a decimal128 value, decoded from the binary integer decimal
/// (BID) encoding.
enum ParsedDecimal128 {
    NaN,
    Infinity { negative: bool },
    Finite {
        negative: bool,
        /// Unbiased power of ten.
        exponent: i32,
        /// At most 34 decimal digits.
        coefficient: u128,
    },
}

impl ParsedDecimal128 {
    fn new(source: &Decimal128) -> Self {
        let bits = u128::from_le_bytes(source.bytes);

        let negative = (bits >> 127) & 1 == 1;
        let combination = ((bits >> 122) & 0x1F) as u8;

        if combination >> 3 == 0b11 {
            match combination {
                0b11111 => return ParsedDecimal128::NaN,
                0b11110 => return ParsedDecimal128::Infinity { negative },
                _ => {
                    // 11-prefixed finite form: the coefficient has an implicit
                    // 0b100 high-bit prefix.
                    let exponent = ((bits >> 111) & 0x3FFF) as i32 - EXPONENT_BIAS;
                    let coefficient = (1u128 << 113) | (bits & ((1u128 << 111) - 1));
                    return ParsedDecimal128::finite(negative, exponent, coefficient);
                }
            }
        }

        let exponent = ((bits >> 113) & 0x3FFF) as i32 - EXPONENT_BIAS;
        let coefficient = bits & ((1u128 << 113) - 1);
        ParsedDecimal128::finite(negative, exponent, coefficient)
    }

    fn finite(negative: bool, exponent: i32, coefficient: u128) -> Self {
        // Non-canonical encodings with more than 34 digits represent zero.
        let coefficient = if coefficient > MAX_COEFFICIENT {
            0
        } else {
            coefficient
        };
        ParsedDecimal128::Finite {
            negative,
            exponent,
            coefficient,
        }
    }
}

impl fmt::Display for ParsedDecimal128 {
    /// Format the value per the decimal128-to-string conversion rules: plain
    /// notation when the adjusted exponent is in `[-6, 0]`, scientific
    /// notation otherwise.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (negative, exponent, coefficient) = match *self {
            ParsedDecimal128::NaN => return f.write_str("NaN"),
            ParsedDecimal128::Infinity { negative } => {
                return f.write_str(if negative { "-Infinity" } else { "Infinity" });
            }
            ParsedDecimal128::Finite {
                negative,
                exponent,
                coefficient,
            } => (negative, exponent, coefficient),
        };

        if negative {
            f.write_str("-")?;
        }

        let digits = coefficient.to_string();
        let adjusted_exponent = exponent + digits.len() as i32 - 1;

        if exponent > 0 || adjusted_exponent < -6 {
            // Scientific notation: d.ddd...E(+/-)n
            f.write_str(&digits[0..1])?;
            if digits.len() > 1 {
                write!(f, ".{}", &digits[1..])?;
            }
            if adjusted_exponent < 0 {
                write!(f, "E{}", adjusted_exponent)
            } else {
                write!(f, "E+{}", adjusted_exponent)
            }
        } else if exponent == 0 {
            f.write_str(&digits)
        } else {
            let point = digits.len() as i32 + exponent;
            if point > 0 {
                let point = point as usize;
                write!(f, "{}.{}", &digits[0..point], &digits[point..])
            } else {
                f.write_str("0.")?;
                for _ in 0..-point {
                    f.write_str("0")?;
                }
                f.write_str(&digits)
            }
        }
    }
}
