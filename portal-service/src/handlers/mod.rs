pub mod app;
pub mod applications;
pub mod auth;
pub mod companies;
pub mod internships;
pub mod messages;
pub mod pages;
pub mod submissions;
pub mod tasks;
pub mod users;
