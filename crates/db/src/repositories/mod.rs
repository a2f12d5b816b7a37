//! Repository layer.

pub mod tour_repo;

pub use tour_repo::PgTourRepo;
