#[macro_use]
extern crate tracing;

pub mod classifier;
pub mod cli;
pub mod geometry;
pub mod recognizer;
pub mod replay;
pub mod scheduler;
pub mod sequence;
pub mod sink;
pub mod tracker;
pub mod utils;

#[cfg(test)]
mod tests;
