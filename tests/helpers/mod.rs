//! Shared helpers for the integration suite.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
