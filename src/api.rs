pub mod home_assistant;
pub mod json_file;
pub mod statistics;
