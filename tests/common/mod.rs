//! Shared helpers for integration tests
#![allow(dead_code)]
#![allow(unused_macros)]

pub mod audit;
pub mod database;
pub mod fixtures;
#[macro_use]
pub mod http;
