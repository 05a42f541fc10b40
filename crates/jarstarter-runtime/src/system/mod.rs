//! Host system queries.

mod network;

pub use network::{address_label, local_ip};
