//! Core domain models shared by the client managers.

mod status;

pub use status::{ClientManagerStatus, ClientStatus};
