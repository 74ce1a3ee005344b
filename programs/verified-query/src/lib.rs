//! Command line client running verified ABCI queries against a remote node.
#![deny(clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod runner;
pub mod tracing;
