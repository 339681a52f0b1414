//! Shared fixtures for the fluentfga integration tests.
//!
//! - [`entities`]: types generated at build time from `fga-model.json`
//! - [`RecordingEngine`]: scripted in-memory engine that records requests
//! - [`LiveStore`]: one provisioned OpenFGA store shared by the live tests

pub mod entities {
    #![allow(dead_code)]
    include!(concat!(env!("OUT_DIR"), "/entities.rs"));
}

mod live;
mod recording;

pub use live::{openfga_url, shared_store, unique_id, LiveStore, FIXTURE_MODEL};
pub use recording::{Recorded, RecordingEngine};
