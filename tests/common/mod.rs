#![allow(dead_code)]

mod fixtures;
mod mocks;
pub use fixtures::*;
#[allow(unused_imports)]
pub use mocks::*;
