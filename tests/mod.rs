// Integration tests for rsmeta

pub mod catalog;
pub mod helpers;
pub mod unit;
