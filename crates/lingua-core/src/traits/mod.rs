//! Collaborator traits (ports)

mod collaborators;

pub use collaborators::{MessageHistoryStore, ProfileDirectory, RepoResult};
