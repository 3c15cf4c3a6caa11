use std::ops::{Add, Mul};

/// Quantity of bits. Layout sizes and offsets are always measured in bits,
/// since bit-fields can start and end inside a byte.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct BitUnits {
    units: u64,
}

impl BitUnits {
    pub const ZERO: Self = Self { units: 0 };

    pub const fn of(value: u64) -> Self {
        Self { units: value }
    }

    pub const fn bits(&self) -> u64 {
        self.units
    }

    /// Total size of `count` consecutive values of this size, or `None`
    /// when the product does not fit in 64 bits.
    pub fn checked_mul(self, count: u64) -> Option<Self> {
        self.units.checked_mul(count).map(Self::of)
    }

    pub fn to_bytes(self) -> Option<ByteUnits> {
        ByteUnits::try_from(self).ok()
    }
}

/// Quantity of whole bytes, for callers that think in `sizeof` terms.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct ByteUnits {
    units: u64,
}

impl ByteUnits {
    pub const ZERO: Self = Self { units: 0 };

    pub const fn of(value: u64) -> Self {
        Self { units: value }
    }

    pub const fn bytes(&self) -> u64 {
        self.units
    }

    pub fn to_bits(self) -> BitUnits {
        BitUnits::from(self)
    }
}

impl TryFrom<BitUnits> for ByteUnits {
    type Error = ();

    fn try_from(value: BitUnits) -> Result<Self, ()> {
        if value.bits() % 8 == 0 {
            Ok(Self {
                units: value.bits() / 8,
            })
        } else {
            Err(())
        }
    }
}

impl From<ByteUnits> for BitUnits {
    fn from(value: ByteUnits) -> Self {
        Self {
            units: value.bytes() * 8,
        }
    }
}

macro_rules! impl_math_for {
    ($units:ty) => {
        impl $units {
            pub fn is_zero(&self) -> bool {
                self.units == 0
            }
        }

        impl Add<$units> for $units {
            type Output = $units;

            fn add(self, rhs: $units) -> Self::Output {
                Self {
                    units: self.units + rhs.units,
                }
            }
        }

        impl Mul<u64> for $units {
            type Output = $units;

            fn mul(self, rhs: u64) -> Self::Output {
                Self {
                    units: self.units * rhs,
                }
            }
        }
    };
}

impl_math_for!(BitUnits);
impl_math_for!(ByteUnits);

#[test]
fn test_whole_byte_conversions() {
    assert_eq!(BitUnits::of(64).to_bytes(), Some(ByteUnits::of(8)));
    assert_eq!(BitUnits::of(3).to_bytes(), None);
    assert_eq!(ByteUnits::of(8).to_bits(), BitUnits::of(64));
    assert!(BitUnits::ZERO.is_zero());
}

#[test]
fn test_checked_mul() {
    assert_eq!(BitUnits::of(32).checked_mul(5), Some(BitUnits::of(160)));
    assert_eq!(BitUnits::of(32).checked_mul(0), Some(BitUnits::ZERO));
    assert_eq!(BitUnits::of(u64::MAX).checked_mul(2), None);
}

#[test]
fn test_math() {
    assert_eq!(BitUnits::of(3) + BitUnits::of(5), BitUnits::of(8));
    assert_eq!(BitUnits::of(32) * 5, BitUnits::of(160));
    assert_eq!(ByteUnits::of(4) + ByteUnits::of(4), ByteUnits::of(8));
    assert_eq!(ByteUnits::of(8) * 3, ByteUnits::of(24));
}
