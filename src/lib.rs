pub mod assemble;
pub mod cli;
pub mod config;
pub mod dates;
pub mod enrich;
pub mod error;
pub mod layout;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod service;
pub mod source;
pub mod store;
pub mod util;
