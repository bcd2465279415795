//! Levels module - database and geometry building

mod database;
mod geometry;

pub use database::*;
pub use geometry::*;
