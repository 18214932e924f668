//! On-demand image resizing server.
//!
//! Requests such as `/images/100/100/uniformfill/jpeg/albums/cat.png` are
//! checked against a whitelist of sizes, resized once, cached and served with
//! HTTP validators.

#[macro_use]
extern crate rocket;

pub mod api;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod images;
pub mod models;
pub mod pipeline;
pub mod protocol;
pub mod registry;
pub mod source;
pub mod timestamp;
