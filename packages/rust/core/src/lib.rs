//! Core pipeline and domain logic for coursedocs.
//!
//! This crate ties together topic/course enumeration, archive packaging,
//! file listing, and page generation into a single site build
//! ([`pipeline::build_site`]).

pub mod archive;
pub mod enumerate;
pub mod listing;
pub mod page;
pub mod pipeline;
