//! Pure in-memory logic: variant combination, category trees, report rollups.

pub mod categories;
pub mod reports;
pub mod variants;
