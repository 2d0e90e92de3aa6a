//! Configuration modules for LimitEasy

pub mod cache;
pub mod limit;
