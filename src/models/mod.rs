pub mod industry;
pub mod project;
pub mod service;
pub mod settings;
pub mod token;
