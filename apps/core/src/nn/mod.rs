//! From-scratch dense matrices and a feed-forward network built on them.

pub mod matrix;
pub mod network;

pub use matrix::{Matrix, MatrixError};
pub use network::{Network, NetworkSummary};
