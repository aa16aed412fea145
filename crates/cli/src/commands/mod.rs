pub mod auth;
pub mod config;
pub mod doctor;
pub mod run;
