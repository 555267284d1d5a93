//! Multi-period planning of stainless steel production from blended scrap.
//!
//! Scrap is bought from several suppliers, each with its own price, capacity and alloy content,
//! and melted into steel grades which must meet exact (or maximum) chromium and nickel contents.
//! The cheapest plan of purchases, production and stock which meets demand is found with a linear
//! (or, with electrolysis, mixed-integer) programme.
#![warn(missing_docs)]
pub mod cli;
pub mod error;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod planner;
pub mod problem;
pub mod settings;
pub mod solution;
pub mod solver;
pub mod sweep;
pub mod units;

#[cfg(test)]
mod fixture;
