//! Helpers shared by the crate's unit tests.

pub mod socket_guard;
