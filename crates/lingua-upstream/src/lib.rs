//! # lingua-upstream
//!
//! Implementations of the collaborator traits from `lingua-core`:
//! HTTP clients for the worker and profile services, plus in-memory
//! stores used by tests and the `memory` history backend.

mod http;
pub mod memory;
pub mod profile;
pub mod worker;

pub use http::build_client;
pub use memory::{InMemoryMessageStore, StaticProfileDirectory};
pub use profile::ProfileClient;
pub use worker::WorkerClient;
