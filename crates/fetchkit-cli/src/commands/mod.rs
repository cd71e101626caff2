pub mod check;
pub mod document_loader;
pub mod fmt;
pub mod new;
pub mod schema;
pub mod tree;

#[cfg(test)]
mod tree_tests;
