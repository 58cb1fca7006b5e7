pub mod decoder;
pub mod row;

pub use decoder::{DecodedFrame, FrameDecoder};
pub use row::{rows_from_packet, rows_from_table, ColumnLayout, OscRow};
