use data_units::BitUnits;
use std::fmt::Display;

/// A requested type would violate one of the model's size invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidShape {
    /// An array's stated total size is not element size times count.
    ArraySizeMismatch {
        stated: BitUnits,
        count: u64,
        element: BitUnits,
    },
    /// Element size times count exceeds the representable size range.
    ArraySizeOverflow { count: u64, element: BitUnits },
}

impl Display for InvalidShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidShape::ArraySizeMismatch {
                stated,
                count,
                element,
            } => write!(
                f,
                "Array of {} elements of {} bits cannot total {} bits",
                count,
                element.bits(),
                stated.bits(),
            ),
            InvalidShape::ArraySizeOverflow { count, element } => write!(
                f,
                "Array of {} elements of {} bits is too large to represent",
                count,
                element.bits(),
            ),
        }
    }
}

impl std::error::Error for InvalidShape {}

/// A by-name aggregate reference with no entry in the layout table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownReference {
    pub name: String,
}

impl Display for UnknownReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reference to unknown aggregate '{}'", self.name)
    }
}

impl std::error::Error for UnknownReference {}
