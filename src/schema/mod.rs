pub mod outcome;
pub mod player;
pub mod requirement;
pub mod template;
pub mod values;
pub mod world;
