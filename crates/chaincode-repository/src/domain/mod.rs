//! # Domain Layer (Inner Hexagon)
//!
//! Criteria, results, method declarations and call values.
//! NO I/O, NO async.
//!
//! - Types here are shared by every other layer.
//! - Dependencies point INWARD only (adapters depend on this, not vice versa).

pub mod criteria;
pub mod entities;
pub mod method;
pub mod parameters;
pub mod value_objects;

pub use criteria::*;
pub use entities::*;
pub use method::*;
pub use parameters::*;
pub use value_objects::*;
