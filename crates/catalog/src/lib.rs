//! `tradepost-catalog` — product listings and the category hierarchy.

pub mod category;
pub mod product;

pub use category::{Category, CategoryTree};
pub use product::{NewProduct, Product, ProductChanges, ProductEvent};
