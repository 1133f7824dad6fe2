//! Interactive terminal map of US computer-science faculty counts.
//!
//! ```text
//!  boundaries (TopoJSON) ──┐
//!                          ├─ data::load ─▶ view::Scene ─▶ ui
//!  faculty table (CSV) ────┘      ▲              │
//!                                 └── filter ◀───┘ range inputs
//! ```

pub mod app;
pub mod braille;
pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod generate;
pub mod map;
pub mod ui;
pub mod view;
