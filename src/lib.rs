pub mod common;
pub mod config;
pub mod crawler;
pub mod hotel;
pub mod matcher;
pub mod persist;
pub mod pipeline;
pub mod routes;
pub mod sheet;
