//! End-to-end tests on synthetic mosaics.
//!
//! - `synthetic_mosaic`: full acquisitions through `create_registrar`, with
//!   stage drift, serpentine scanning and dependent tiles
