pub mod news;
pub mod saved;
pub mod users;
