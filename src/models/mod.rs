//! Domain models shared by the scanner client, orchestrator, and API.

pub mod alert;
pub mod scan;
