pub mod assembler;
pub mod config;
pub mod hasher;
pub mod metadata;
pub mod notebook;
pub mod report;
pub mod transform;
pub mod types;
