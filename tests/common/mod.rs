//! Common test utilities for pkgcheck integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use server::*;
