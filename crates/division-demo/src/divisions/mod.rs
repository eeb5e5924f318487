pub mod hello;
pub mod memorydb;
