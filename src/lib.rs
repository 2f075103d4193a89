//! Agentready - agent-readiness scoring for Go, Python and TypeScript codebases
//!
//! A scan discovers project files, parses them, runs one analyzer per
//! category, interpolates raw metrics onto a 1-10 scale and combines the
//! category scores into a weighted composite with a readiness tier.

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod graph;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod recommend;
pub mod reporters;
pub mod scoring;
