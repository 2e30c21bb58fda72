pub mod config;
pub mod engine;
pub mod errors;
pub mod junit;
pub mod model;
pub mod reader;
pub mod report;
pub mod resolver;
pub mod storage;
pub mod writer;
