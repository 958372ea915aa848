//! CruiseCast service layer.
//!
//! Implements the itinerary-normalization and forecast-resolution pipeline
//! behind the cruise-planning UI: dataset access and caching, itinerary
//! building with sea-day synthesis, port resolution, short-range forecast
//! retrieval with climate-normals backfill, timeline merging, and the
//! packing-checklist and saved-cruise features built on top of them.
//!
//! The UI layer (views, routing, rendering) and the hosted auth provider
//! are external collaborators; nothing in this crate depends on them.

pub mod cache;
pub mod config;
pub mod ingest;
pub mod itinerary;
pub mod logging;
pub mod model;
pub mod packing;
pub mod planner;
pub mod ports;
pub mod saved;
pub mod timeline;
pub mod verify;
