//! Interactive selection and camera framing for overlapping wine-region
//! (AVA) boundaries, plus the terminal host that drives it.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod feature;
pub mod fetch;
pub mod map;
pub mod selection;
pub mod ui;
