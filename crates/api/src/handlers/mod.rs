pub mod analytics;
pub mod hotspots;
pub mod scenes;
pub mod tours;
