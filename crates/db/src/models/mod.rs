//! Database row types and their conversion into core records.

pub mod tour;
