// Hachidori image optimization library

pub mod config;
pub mod error;
pub mod image_optimizer;
pub mod logging;
pub mod queue;
