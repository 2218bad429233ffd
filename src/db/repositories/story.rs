use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
    sea_query::{Expr, LikeExpr},
};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::Page;
use crate::entities::{prelude::*, stories};

/// Orderings accepted by the filter listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorySort {
    #[default]
    UpdatedDesc,
    ViewsDesc,
    ChaptersDesc,
    TitleAsc,
}

impl FromStr for StorySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "updated_desc" => Ok(Self::UpdatedDesc),
            "views_desc" => Ok(Self::ViewsDesc),
            "chapters_desc" => Ok(Self::ChaptersDesc),
            "title_asc" => Ok(Self::TitleAsc),
            other => Err(format!(
                "Unknown sort '{other}', expected one of updated_desc, views_desc, chapters_desc, title_asc"
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoryFilter {
    /// Exact membership in the genre list
    pub genre: Option<String>,
    pub status: Option<String>,
    /// Case-insensitive substring of the display author
    pub author: Option<String>,
    pub sort: StorySort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct GenreCount {
    pub genre: String,
    pub count: i64,
}

pub struct StoryRepository {
    conn: DatabaseConnection,
}

impl StoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn visible() -> Condition {
        Condition::all()
            .add(stories::Column::IsHidden.eq(false))
            .add(stories::Column::IsBanned.eq(false))
    }

    pub async fn insert(&self, model: stories::ActiveModel) -> Result<stories::Model> {
        model
            .insert(&self.conn)
            .await
            .context("Failed to insert story")
    }

    pub async fn update(&self, model: stories::ActiveModel) -> Result<stories::Model> {
        model
            .update(&self.conn)
            .await
            .context("Failed to update story")
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<stories::Model>> {
        Stories::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query story by ID")
    }

    pub async fn get_by_title(&self, title: &str) -> Result<Option<stories::Model>> {
        Stories::find()
            .filter(stories::Column::Title.eq(title))
            .one(&self.conn)
            .await
            .context("Failed to query story by title")
    }

    pub async fn list_visible(&self) -> Result<Vec<stories::Model>> {
        Stories::find()
            .filter(Self::visible())
            .order_by_desc(stories::Column::UpdatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list stories")
    }

    pub async fn search_by_title(&self, needle: &str) -> Result<Vec<stories::Model>> {
        Stories::find()
            .filter(Self::visible())
            .filter(stories::Column::Title.like(contains_pattern(needle)))
            .order_by_asc(stories::Column::Title)
            .all(&self.conn)
            .await
            .context("Failed to search stories")
    }

    pub async fn filter(
        &self,
        filter: &StoryFilter,
        page: Page,
    ) -> Result<(Vec<stories::Model>, u64)> {
        let mut query = Stories::find().filter(Self::visible());

        if let Some(genre) = &filter.genre {
            query = query.filter(Expr::cust_with_values(
                "EXISTS (SELECT 1 FROM json_each(stories.genres) WHERE json_each.value = ?)",
                [genre.clone()],
            ));
        }
        if let Some(status) = &filter.status {
            query = query.filter(stories::Column::Status.eq(status.as_str()));
        }
        if let Some(author) = &filter.author {
            query = query.filter(stories::Column::Author.like(contains_pattern(author)));
        }

        let total = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count filtered stories")?;

        let (column, order) = match filter.sort {
            StorySort::UpdatedDesc => (stories::Column::UpdatedAt, Order::Desc),
            StorySort::ViewsDesc => (stories::Column::ViewCount, Order::Desc),
            StorySort::ChaptersDesc => (stories::Column::ChaptersCount, Order::Desc),
            StorySort::TitleAsc => (stories::Column::Title, Order::Asc),
        };

        let rows = query
            .order_by(column, order)
            .order_by_asc(stories::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.conn)
            .await
            .context("Failed to filter stories")?;

        Ok((rows, total))
    }

    pub async fn top_by_views(&self, limit: u64) -> Result<Vec<stories::Model>> {
        Stories::find()
            .filter(Self::visible())
            .order_by_desc(stories::Column::ViewCount)
            .order_by_asc(stories::Column::Title)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query story ranking")
    }

    pub async fn featured(&self) -> Result<Vec<stories::Model>> {
        Stories::find()
            .filter(Self::visible())
            .filter(stories::Column::IsFeatured.eq(true))
            .order_by_desc(stories::Column::UpdatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query featured stories")
    }

    pub async fn recently_updated(&self, limit: u64) -> Result<Vec<stories::Model>> {
        Stories::find()
            .filter(Self::visible())
            .order_by_desc(stories::Column::UpdatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query recently updated stories")
    }

    pub async fn by_creator(&self, user_id: Uuid) -> Result<Vec<stories::Model>> {
        Stories::find()
            .filter(stories::Column::CreatedBy.eq(user_id))
            .order_by_desc(stories::Column::UpdatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query stories by creator")
    }

    pub async fn genre_counts(&self) -> Result<Vec<GenreCount>> {
        let backend = self.conn.get_database_backend();
        GenreCount::find_by_statement(Statement::from_string(
            backend,
            "SELECT g.value AS genre, COUNT(*) AS count \
             FROM stories s, json_each(s.genres) g \
             WHERE s.is_hidden = 0 AND s.is_banned = 0 \
             GROUP BY g.value \
             ORDER BY count DESC, genre ASC"
                .to_string(),
        ))
        .all(&self.conn)
        .await
        .context("Failed to aggregate genre counts")
    }

    /// Sets or clears the ban flag together with the soft-delete marker.
    pub async fn set_banned(&self, title: &str, banned: bool) -> Result<bool> {
        let now = Utc::now();
        let deleted_at = banned.then_some(now);

        let result = Stories::update_many()
            .col_expr(stories::Column::IsBanned, Expr::value(banned))
            .col_expr(stories::Column::DeletedAt, Expr::value(deleted_at))
            .col_expr(stories::Column::UpdatedAt, Expr::value(now))
            .filter(stories::Column::Title.eq(title))
            .exec(&self.conn)
            .await
            .context("Failed to update story ban flag")?;

        Ok(result.rows_affected > 0)
    }

    /// Single-row `chapters_count = chapters_count + delta`, also refreshing
    /// `updated_at`. Returns the number of rows touched.
    pub async fn adjust_chapter_count(&self, id: Uuid, delta: i64) -> Result<u64> {
        let result = Stories::update_many()
            .col_expr(
                stories::Column::ChaptersCount,
                Expr::col(stories::Column::ChaptersCount).add(delta),
            )
            .col_expr(stories::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stories::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to adjust chapters_count")?;

        Ok(result.rows_affected)
    }

    pub async fn increment_views(&self, id: Uuid) -> Result<u64> {
        let result = Stories::update_many()
            .col_expr(
                stories::Column::ViewCount,
                Expr::col(stories::Column::ViewCount).add(1),
            )
            .filter(stories::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to increment story views")?;

        Ok(result.rows_affected)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = Stories::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete story")?;

        Ok(result.rows_affected)
    }
}

/// `%needle%` with the LIKE wildcards in `needle` escaped.
fn contains_pattern(needle: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}
