//! Item source adapters

pub mod reddit;
pub mod x_search;

pub use reddit::RedditSource;
pub use x_search::XSearchSource;
