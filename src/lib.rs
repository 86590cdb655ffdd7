#[macro_use]
extern crate log;

pub mod branch;
pub mod cli;
pub mod env;
pub mod error;
pub mod fs;
pub mod materializer;
pub mod merge;
pub mod model;
pub mod oracle;
pub mod options;
pub mod parser;
pub mod predictor;
pub mod protocol;
pub mod runner;
pub mod selector;

pub use error::{Error, Result};
