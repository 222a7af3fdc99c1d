pub mod collector;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod refiner;

pub use engine::{Analyser, Analysis, EngineOptions, Limit, Score, UciEngine};
pub use error::WorkerError;
