//! Application core: boot sequencing, zero direct SDK calls.
//!
//! All interaction with ESP-IDF happens through the **port traits** in
//! [`ports`], so the sequencing rules are testable on the host.

pub mod events;
pub mod ports;
pub mod service;
