//! Search backend implementations.
//!
//! Each module provides a struct implementing [`crate::backend::SearchBackend`]
//! against one remote repository-hosting API.

pub mod gitea;
pub mod github;

pub use gitea::GiteaBackend;
pub use github::GithubBackend;
