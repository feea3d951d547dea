//! devs - A community feed for developer side-projects
//!
//! Users submit projects with hashtags and links, rate and discuss them, and
//! post inspirations that projects can implement. The core is the project
//! feed: sorted, filtered and cursor-paginated.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
