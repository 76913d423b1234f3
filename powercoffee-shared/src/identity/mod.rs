//! User identity and role-assignment workflow
//!
//! [`IdentityService`] covers signup, password and external sign-in, the reset
//! token lifecycle, password change and user CRUD. Its collaborators are the
//! trait objects in [`IdentityDeps`], so the same workflow runs over
//! PostgreSQL in production and over [`crate::store::memory::MemoryStore`]
//! in tests.
//!
//! Reset tokens move through: absent → issued → consumed | expired |
//! replaced by a newer issue.

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{AuthResponse, MessageResponse, SignupInput, UpdateUserInput, UserResponse};
pub use error::IdentityError;
pub use service::{IdentityConfig, IdentityDeps, IdentityService};
