use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub title: String,

    /// Display name, not the ownership anchor
    pub author: String,

    pub description: String,

    /// JSON array of genre names
    pub genres: Json,

    pub cover_url: Option<String>,

    pub status: String,

    pub chapters_count: i64,

    /// Highest chapter number ever assigned; never decremented
    pub last_chapter_number: i32,

    pub view_count: i64,

    pub is_featured: bool,

    pub is_hidden: bool,

    pub is_banned: bool,

    pub deleted_at: Option<DateTimeUtc>,

    #[sea_orm(indexed)]
    pub created_by: Uuid,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.is_hidden && !self.is_banned
    }

    #[must_use]
    pub fn genre_list(&self) -> Vec<String> {
        serde_json::from_value(self.genres.clone()).unwrap_or_default()
    }
}
