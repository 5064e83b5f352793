pub mod content;
pub mod llm_client;
pub mod persona;
pub mod progress;
pub mod runner;
pub mod toolbox;
pub mod tools;
