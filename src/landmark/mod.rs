pub mod identity;
pub mod mask;
pub mod table;

pub use identity::{fallback_name, LandmarkMap};
pub use mask::LandmarkMask;
pub use table::{read_table, read_table_or_empty};
