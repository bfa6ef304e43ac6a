//! Fetcher implementations and per-platform request strategies.

pub mod http;
pub mod strategy;

pub use http::HttpFetcher;
pub use strategy::{default_strategy, strategy_for, PlatformStrategy};
