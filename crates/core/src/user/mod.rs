//! User ownership ports

pub mod ports;
