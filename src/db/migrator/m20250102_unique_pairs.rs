use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        // One number per chapter slot within a story.
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_chapters_story_number_unique ON chapters(story_id, chapter_number)",
        )
        .await?;

        // At most one bookshelf entry per (user, story).
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_bookshelf_user_story_unique ON bookshelf_items(user_id, story_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_bookshelf_user_story_unique")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_chapters_story_number_unique")
            .await?;

        Ok(())
    }
}
