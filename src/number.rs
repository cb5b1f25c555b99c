//! Conversion of textual kernel numbers into integers
//!
//! Kernel pseudo-files mix decimal counters with hexadecimal fields (socket
//! addresses, flags, device numbers...), usually without any "0x" prefix to
//! tell them apart. So the base is never guessed: it is always spelled out by
//! the caller.

use crate::error::{Error, Result};


/// Numeric base in which a token is written
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Base {
    Decimal,
    Hex,
}
//
impl Base {
    /// Radix to be handed to the standard integer parsers
    pub fn radix(self) -> u32 {
        match self {
            Base::Decimal => 10,
            Base::Hex => 16,
        }
    }

    /// Human-readable description, used in error messages
    fn description(self) -> &'static str {
        match self {
            Base::Decimal => "a decimal integer",
            Base::Hex => "a hexadecimal integer",
        }
    }
}


/// Integer types which can be parsed from text in an arbitrary base
pub trait FromRadix: Sized {
    /// Parse the whole string, failing on any unexpected character
    fn from_radix(text: &str, radix: u32) -> Option<Self>;
}

/// Kernel files never print an explicit plus sign, which the standard integer
/// parsers would otherwise accept
const PLUS_SIGN: char = '+';

macro_rules! impl_from_radix {
    ($($int:ty),*) => {
        $(
            impl FromRadix for $int {
                #[inline]
                fn from_radix(text: &str, radix: u32) -> Option<Self> {
                    if text.starts_with(PLUS_SIGN) {
                        return None;
                    }
                    <$int>::from_str_radix(text, radix).ok()
                }
            }
        )*
    };
}

impl_from_radix!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);


/// Parse a token as an integer of the requested type and base
///
/// The token must be a number and nothing else: surrounding whitespace or
/// trailing garbage is rejected, so callers are expected to trim beforehand.
///
pub fn to_number<T: FromRadix>(text: &str, base: Base) -> Result<T> {
    T::from_radix(text, base.radix())
     .ok_or_else(|| Error::malformed(text, base.description()))
}
