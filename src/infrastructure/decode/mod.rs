// ============================================================
// TABULAR DECODERS
// ============================================================
// Convert raw upload bytes into the in-memory Table representation.

pub mod csv;
pub mod xlsx;

use crate::domain::error::Result;
use crate::domain::table::{SourceFormat, Table};

/// Decode an uploaded payload according to its declared format.
pub fn decode_bytes(bytes: &[u8], format: SourceFormat) -> Result<Table> {
    match format {
        SourceFormat::Csv => csv::decode_bytes(bytes),
        SourceFormat::Xlsx => xlsx::decode_bytes(bytes),
    }
}
