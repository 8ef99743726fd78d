pub mod aoi;
pub mod api;
pub mod classify;
pub mod console;
pub mod dashboard;
pub mod demo;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod logging;
pub mod model;
pub mod poll;
pub mod render;
pub mod session;
pub mod state;
pub mod ui;
