//! Graphex - Interactive Graph Exploration
//!
//! An exploration client core for remote graph-query services: the
//! controller owns authoritative graph state, merges asynchronous query
//! results without duplication, and coordinates user interaction with an
//! asynchronous force-directed layout surface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod events;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod surface;
