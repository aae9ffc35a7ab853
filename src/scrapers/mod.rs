//! Turning fetched page content into a canonical stream link.
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`extract`] | Applies a channel's lookup strategy to page content |
//! | [`normalize`] | Accepts or rejects a candidate and canonicalizes it |
//!
//! Extraction never fails loudly: a page without a usable candidate yields
//! `None` and the reconciler falls back to the previous playlist.

pub mod extract;
pub mod normalize;
