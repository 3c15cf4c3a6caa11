mod error;
mod integer_sign;
mod record;
mod table;
mod ty;

pub use error::*;
pub use integer_sign::IntegerSign;
pub use record::*;
pub use table::LayoutTable;
pub use ty::*;
