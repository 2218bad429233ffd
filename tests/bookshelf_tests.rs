use novelshelf::config::Config;
use novelshelf::db::BookshelfSort;
use novelshelf::domain::{Identity, Page, Role, SortOrder};
use novelshelf::services::{BookshelfError, NewStory};
use novelshelf::state::SharedState;
use uuid::Uuid;

mod common;
use common::TempDb;

struct Fixture {
    state: SharedState,
    _db: TempDb,
    reader: Uuid,
    author: Identity,
}

async fn fixture() -> Fixture {
    let db = TempDb::new("novelshelf-bookshelf-test");

    let mut config = Config::default();
    config.general.database_path = db.url();
    config.security.jwt_secret = "bookshelf-test-signing-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = SharedState::new(config)
        .await
        .expect("Failed to create shared state");

    let reader = state
        .auth_service
        .register("reader", "password1")
        .await
        .unwrap();
    let author = state
        .auth_service
        .register("writer", "password1")
        .await
        .unwrap();
    state
        .auth_service
        .set_role("writer", Role::Author)
        .await
        .unwrap();

    Fixture {
        state,
        _db: db,
        reader: reader.id,
        author: Identity {
            id: author.id,
            username: author.username,
            role: Role::Author,
        },
    }
}

impl Fixture {
    async fn story(&self, title: &str) -> Uuid {
        self.state
            .story_service
            .create_story(
                &self.author,
                NewStory {
                    title: title.to_string(),
                    ..NewStory::default()
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn chapter(&self, story_id: Uuid, title: &str) -> Uuid {
        self.state
            .chapter_service
            .create_chapter(story_id, title, "Body text")
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn add_rejects_a_tracked_story() {
    let fx = fixture().await;
    let story_id = fx.story("Shelved").await;
    let chapter_id = fx.chapter(story_id, "One").await;

    let entry = fx
        .state
        .bookshelf_service
        .add(fx.reader, story_id, Some(chapter_id))
        .await
        .unwrap();
    assert_eq!(entry.last_chapter_id, Some(chapter_id));
    assert_eq!(entry.user_id, fx.reader);

    let err = fx
        .state
        .bookshelf_service
        .add(fx.reader, story_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookshelfError::Conflict(_)));

    let stored = fx
        .state
        .store
        .find_bookshelf_entry(fx.reader, story_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_chapter_id, Some(chapter_id));
}

#[tokio::test]
async fn last_chapter_upsert_creates_then_overwrites() {
    let fx = fixture().await;
    let story_id = fx.story("Progress").await;
    let first = fx.chapter(story_id, "One").await;
    let second = fx.chapter(story_id, "Two").await;

    let created = fx
        .state
        .bookshelf_service
        .update_last_chapter(fx.reader, story_id, first)
        .await
        .unwrap();
    assert_eq!(created.last_chapter_id, Some(first));

    let updated = fx
        .state
        .bookshelf_service
        .update_last_chapter(fx.reader, story_id, second)
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.last_chapter_id, Some(second));
    assert_eq!(updated.added_at, created.added_at);
    assert!(updated.updated_at >= created.updated_at);

    let page = fx
        .state
        .bookshelf_service
        .list(fx.reader, Page::default(), BookshelfSort::default(), SortOrder::Desc)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn bad_targets_are_rejected() {
    let fx = fixture().await;
    let story_id = fx.story("Target").await;
    let other_id = fx.story("Elsewhere").await;
    let foreign_chapter = fx.chapter(other_id, "Foreign").await;

    let err = fx
        .state
        .bookshelf_service
        .add(fx.reader, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookshelfError::NotFound(_)));

    let err = fx
        .state
        .bookshelf_service
        .add(fx.reader, story_id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, BookshelfError::NotFound(_)));

    let err = fx
        .state
        .bookshelf_service
        .update_last_chapter(fx.reader, story_id, foreign_chapter)
        .await
        .unwrap_err();
    assert!(matches!(err, BookshelfError::Validation(_)));

    let err = fx
        .state
        .bookshelf_service
        .remove(fx.reader, story_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookshelfError::NotFound(_)));
}

#[tokio::test]
async fn remove_returns_the_pair_to_absent() {
    let fx = fixture().await;
    let story_id = fx.story("Fleeting").await;

    fx.state
        .bookshelf_service
        .add(fx.reader, story_id, None)
        .await
        .unwrap();
    fx.state
        .bookshelf_service
        .remove(fx.reader, story_id)
        .await
        .unwrap();

    // Absent again, so a fresh add succeeds.
    fx.state
        .bookshelf_service
        .add(fx.reader, story_id, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn listing_joins_current_story_and_chapter_data() {
    let fx = fixture().await;

    let empty = fx
        .state
        .bookshelf_service
        .list(fx.reader, Page::default(), BookshelfSort::default(), SortOrder::Desc)
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.items.is_empty());
    assert_eq!(empty.page, 1);

    let beta = fx.story("Beta").await;
    let alpha = fx.story("Alpha").await;
    let gamma = fx.story("Gamma").await;
    let beta_chapter = fx.chapter(beta, "Beta One").await;
    let alpha_chapter = fx.chapter(alpha, "Alpha One").await;

    for (story_id, chapter_id) in [
        (beta, Some(beta_chapter)),
        (alpha, Some(alpha_chapter)),
        (gamma, None),
    ] {
        fx.state
            .bookshelf_service
            .add(fx.reader, story_id, chapter_id)
            .await
            .unwrap();
    }

    fx.state
        .chapter_service
        .delete_chapter(alpha_chapter)
        .await
        .unwrap();

    let page = fx
        .state
        .bookshelf_service
        .list(
            fx.reader,
            Page::default(),
            BookshelfSort::StoryTitle,
            SortOrder::Asc,
        )
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    let titles: Vec<_> = page
        .items
        .iter()
        .map(|row| row.story_title.clone().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

    // The deleted chapter leaves the pointer but no joined data.
    assert_eq!(page.items[0].last_chapter_id, Some(alpha_chapter));
    assert_eq!(page.items[0].chapter_number, None);
    assert_eq!(page.items[1].chapter_number, Some(1));
    assert_eq!(page.items[1].chapter_title.as_deref(), Some("Beta One"));
    assert_eq!(page.items[2].last_chapter_id, None);

    let second_page = fx
        .state
        .bookshelf_service
        .list(
            fx.reader,
            Page::clamped(Some(2), Some(2)),
            BookshelfSort::StoryTitle,
            SortOrder::Desc,
        )
        .await
        .unwrap();
    assert_eq!(second_page.total, 3);
    assert_eq!(second_page.items.len(), 1);
    assert_eq!(second_page.items[0].story_title.as_deref(), Some("Alpha"));
}
