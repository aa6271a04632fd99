// src/app/mod.rs
//
// Composition root

pub mod catalog_init;

pub use catalog_init::Catalog;
