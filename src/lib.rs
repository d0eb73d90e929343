//! Terminal client for a workday attendance server. Users clock in and out, take breaks and
//! review their hours by day, week or month; administrators register users and look at every
//! recorded workday.
//!

pub mod api;
pub mod cli;
pub mod config;
pub mod export;
pub mod tracker;
pub mod utils;
