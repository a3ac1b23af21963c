//! # Preview Server
//!
//! A small web server for looking at rendered visualizations outside a
//! notebook. It serves the visualization chosen at start-up on `/` and renders
//! arbitrary component/props pairs posted to `/render`.

pub mod routes;
