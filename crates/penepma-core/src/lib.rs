pub mod common;
pub mod domain;
pub mod format;
pub mod geometry;
pub mod indexing;
pub mod material;
pub mod modules;
pub mod transitions;
