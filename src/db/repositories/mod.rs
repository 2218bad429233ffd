pub mod bookshelf;
pub mod chapter;
pub mod comment;
pub mod story;
pub mod user;
