pub mod analysis;
pub mod calculator;
pub mod choice;
pub mod context;
pub mod encounter;
pub mod factory;
pub mod library;
pub mod pipeline;
pub mod processor;
pub mod selector;
