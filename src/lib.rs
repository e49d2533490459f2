pub mod api;
pub mod catalog;
pub mod config;
pub mod humanize;
pub mod observability;
pub mod platform;
pub mod queue;
pub mod schedule;
pub mod storage;
pub mod worker;
