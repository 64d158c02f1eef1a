//! Wire formats for the geo, remote-control, and heartbeat endpoints.

pub mod models;
