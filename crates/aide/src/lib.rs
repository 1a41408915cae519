pub mod agent;
pub mod card;
pub mod dispatch;
pub mod errors;
pub mod graph;
pub mod models;
pub mod operations;
pub mod prompt_template;
pub mod providers;
