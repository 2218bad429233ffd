pub mod prelude;

pub mod bookshelf_items;
pub mod chapters;
pub mod comments;
pub mod stories;
pub mod users;
