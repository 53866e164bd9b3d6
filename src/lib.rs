// Library for tests to access modules

pub mod charts;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod version;
pub mod worker;
