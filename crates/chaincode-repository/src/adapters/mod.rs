//! # Adapters Layer (Outer Hexagon)
//!
//! - `collection_config`: private data collection files (JSON, YAML)
//! - `descriptor`: TOML repository descriptors
//! - `in_memory`: scripted `ChaincodeOperations` for tests and local runs

pub mod collection_config;
pub mod descriptor;
pub mod in_memory;

pub use collection_config::*;
pub use descriptor::*;
pub use in_memory::*;
