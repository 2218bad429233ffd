pub use super::bookshelf_items::Entity as BookshelfItems;
pub use super::chapters::Entity as Chapters;
pub use super::comments::Entity as Comments;
pub use super::stories::Entity as Stories;
pub use super::users::Entity as Users;
