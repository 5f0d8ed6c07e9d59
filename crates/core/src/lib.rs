//! osc-core: Core library for the osc S3 CLI client
//!
//! This crate provides the network-free core of the osc CLI:
//! - Profile (credential) management
//! - Transfer planning (chunk geometry and mode decisions)
//! - The shared error type with exit-code mapping
//!
//! Everything that talks to the network lives in osc-s3; keeping this
//! crate pure makes the planning logic trivially testable.

pub mod error;
pub mod planner;
pub mod profile;

pub use error::{Error, Result};
pub use planner::{
    decide, ChunkSpec, ForcedMode, TransferMode, TransferPlan, DEFAULT_CHUNK_SIZE, DEFAULT_WORKERS,
    MAX_PARTS, MIN_PART_SIZE,
};
pub use profile::{Credentials, Profile, ProfileStore, ProfilesFile};
