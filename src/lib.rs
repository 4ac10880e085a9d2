//! Gator - a command-line RSS feed aggregator
//!
//! Users register a local identity, add feeds they own, and fetch feed XML
//! into a structured form. Commands are looked up by name in a registry and
//! run against shared state holding the config, database and HTTP fetcher.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod middleware;
