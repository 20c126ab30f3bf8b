//! Request extractors shared by handlers.
//!
//! - [`acting_user::ActingUser`] -- the caller identified by the `X-User-Id` header.

pub mod acting_user;
