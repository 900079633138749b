//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Port (Inbound)**: `RepositoryQuery`
//! - **Driven Port (Outbound)**: `ChaincodeOperations`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
