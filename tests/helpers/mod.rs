// Test helpers shared by the integration and contract tests.
//
// The billing services run against in-memory repositories that keep the
// guard contract of the MySQL ones: `lock` waits while another guard holds
// the same document, and a guard dropped without `commit` changes nothing.
//
// Usage:
//   #[path = "../helpers/mod.rs"]
//   mod helpers;
//   use helpers::*;

#![allow(dead_code)]


pub use memory_store::*;
pub use test_data::*;
