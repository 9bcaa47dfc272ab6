//! Shared utilities for the prism crates.
//!
//! At the moment this is the hashing layer: `hashbrown` containers driven by a
//! fixed-seed `foldhash` state, so hashes of property values are reproducible
//! inside one build.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

pub mod hash;
