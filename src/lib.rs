//! Terminal video search browser: query the YouTube search API, cache result
//! sets per query, and lay the active set out on a navigable shelf.

pub mod app;
pub mod bus;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod feed;
pub mod input;
pub mod logging;
pub mod search;
pub mod selection;
pub mod theme;
pub mod ui;
pub mod video;
pub mod youtube;

#[cfg(test)]
mod testing;
