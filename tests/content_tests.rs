use novelshelf::config::Config;
use novelshelf::domain::{Identity, Page, Role, StoryRef};
use novelshelf::services::{
    AuthError, ChapterChanges, ContentError, FollowUpOutcome, FollowUps, NewStory,
    SecondaryWrite, StoryChanges,
};
use novelshelf::state::SharedState;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

mod common;
use common::TempDb;

async fn shared_state() -> (SharedState, TempDb) {
    let db = TempDb::new("novelshelf-content-test");

    let mut config = Config::default();
    config.general.database_path = db.url();
    config.security.jwt_secret = "content-test-signing-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = SharedState::new(config)
        .await
        .expect("Failed to create shared state");
    (state, db)
}

async fn user_with_role(state: &SharedState, username: &str, role: Role) -> Identity {
    let info = state
        .auth_service
        .register(username, "password1")
        .await
        .unwrap();
    if role != Role::User {
        state.auth_service.set_role(username, role).await.unwrap();
    }
    Identity {
        id: info.id,
        username: info.username,
        role,
    }
}

async fn story(state: &SharedState, owner: &Identity, title: &str) -> Uuid {
    state
        .story_service
        .create_story(
            owner,
            NewStory {
                title: title.to_string(),
                genres: vec!["mystery".to_string()],
                ..NewStory::default()
            },
        )
        .await
        .unwrap()
        .id
}

async fn chapter(state: &SharedState, story_id: Uuid, title: &str) -> Uuid {
    state
        .chapter_service
        .create_chapter(story_id, title, "Body text")
        .await
        .unwrap()
        .id
}

async fn chapters_count(state: &SharedState, story_id: Uuid) -> i64 {
    state
        .store
        .get_story(story_id)
        .await
        .unwrap()
        .unwrap()
        .chapters_count
}

#[tokio::test]
async fn counter_tracks_chapters_and_numbers_never_repeat() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let story_id = story(&state, &author, "Counting").await;

    let first = chapter(&state, story_id, "One").await;
    let second = chapter(&state, story_id, "Two").await;
    let third = chapter(&state, story_id, "Three").await;
    assert_eq!(chapters_count(&state, story_id).await, 3);

    state.chapter_service.delete_chapter(third).await.unwrap();
    state.chapter_service.delete_chapter(first).await.unwrap();
    assert_eq!(chapters_count(&state, story_id).await, 1);
    assert_eq!(state.store.count_chapters(story_id).await.unwrap(), 1);

    let fourth = state
        .chapter_service
        .create_chapter(story_id, "Four", "Body text")
        .await
        .unwrap();
    assert_eq!(fourth.chapter_number, 4);
    assert_eq!(chapters_count(&state, story_id).await, 2);

    let survivor = state.store.get_chapter(second).await.unwrap().unwrap();
    assert_eq!(survivor.chapter_number, 2);
}

#[tokio::test]
async fn chapter_validation_and_missing_story() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let story_id = story(&state, &author, "Rules").await;

    let err = state
        .chapter_service
        .create_chapter(story_id, "   ", "Body")
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));

    let err = state
        .chapter_service
        .create_chapter(story_id, "Title", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));

    let err = state
        .chapter_service
        .create_chapter(Uuid::new_v4(), "Title", "Body")
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));

    let err = state
        .chapter_service
        .delete_chapter(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));
    assert_eq!(chapters_count(&state, story_id).await, 0);
}

#[tokio::test]
async fn reads_count_views_and_link_neighbours() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let story_id = story(&state, &author, "Viewed").await;

    let first = chapter(&state, story_id, "One").await;
    let second = chapter(&state, story_id, "Two").await;
    let third = chapter(&state, story_id, "Three").await;

    let read = state.chapter_service.read_by_id(second).await.unwrap();
    assert_eq!(read.chapter.view_count, 1);
    let read = state.chapter_service.read_by_id(second).await.unwrap();
    assert_eq!(read.chapter.view_count, 2);
    assert_eq!(read.previous.map(|c| c.id), Some(first));
    assert_eq!(read.next.map(|c| c.id), Some(third));

    let by_number = state
        .chapter_service
        .read_by_story_and_number(story_id, 1)
        .await
        .unwrap();
    assert_eq!(by_number.id, first);
    assert_eq!(by_number.view_count, 1);

    let story = state.store.get_story(story_id).await.unwrap().unwrap();
    assert_eq!(story.view_count, 3);

    // A hidden middle chapter is skipped by the neighbour links.
    state
        .chapter_service
        .update_chapter(
            second,
            ChapterChanges {
                is_hidden: Some(true),
                ..ChapterChanges::default()
            },
        )
        .await
        .unwrap();

    let read = state.chapter_service.read_by_id(first).await.unwrap();
    assert!(read.previous.is_none());
    assert_eq!(read.next.map(|c| c.id), Some(third));

    let err = state.chapter_service.read_by_id(second).await.unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));

    let err = state
        .chapter_service
        .read_by_story_and_number(story_id, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));
}

#[tokio::test]
async fn banned_story_hides_its_chapters() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let story_id = story(&state, &author, "Forbidden Tale").await;
    let chapter_id = chapter(&state, story_id, "One").await;

    state.story_service.ban_story("Forbidden Tale").await.unwrap();

    let err = state
        .chapter_service
        .read_by_id(chapter_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));

    let err = state.story_service.get_story(story_id).await.unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));

    let stored = state.store.get_story(story_id).await.unwrap().unwrap();
    assert!(stored.is_banned);
    assert!(stored.deleted_at.is_some());

    state
        .story_service
        .unban_story("Forbidden Tale")
        .await
        .unwrap();
    let stored = state.store.get_story(story_id).await.unwrap().unwrap();
    assert!(!stored.is_banned);
    assert!(stored.deleted_at.is_none());
    assert!(state.chapter_service.read_by_id(chapter_id).await.is_ok());

    let err = state.story_service.ban_story("No Such Title").await.unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));
}

#[tokio::test]
async fn cascade_removes_dependents() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let reader = user_with_role(&state, "reader", Role::User).await;
    let story_id = story(&state, &author, "Cascade").await;
    let keep_id = story(&state, &author, "Keeper").await;

    let first = chapter(&state, story_id, "One").await;
    chapter(&state, story_id, "Two").await;
    let kept_chapter = chapter(&state, keep_id, "Kept").await;

    state
        .comment_service
        .add_comment(&reader, story_id, first, "great")
        .await
        .unwrap();
    state
        .comment_service
        .add_comment(&reader, keep_id, kept_chapter, "also great")
        .await
        .unwrap();
    state
        .bookshelf_service
        .add(reader.id, story_id, Some(first))
        .await
        .unwrap();
    state
        .bookshelf_service
        .add(reader.id, keep_id, None)
        .await
        .unwrap();

    let report = state.story_service.delete_story(story_id).await.unwrap();
    assert_eq!(report.bookshelf_entries, 1);
    assert_eq!(report.comments, 1);
    assert_eq!(report.chapters, 2);

    assert!(state.store.get_story(story_id).await.unwrap().is_none());
    assert!(state.store.get_chapter(first).await.unwrap().is_none());
    assert!(
        state
            .store
            .find_bookshelf_entry(reader.id, story_id)
            .await
            .unwrap()
            .is_none()
    );

    let (comments, total) = state
        .comment_service
        .list_comments(kept_chapter, Page::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(comments[0].content, "also great");
    assert!(
        state
            .store
            .find_bookshelf_entry(reader.id, keep_id)
            .await
            .unwrap()
            .is_some()
    );

    let err = state.story_service.delete_story(story_id).await.unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));
}

#[tokio::test]
async fn failed_cascade_stage_keeps_the_story() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let reader = user_with_role(&state, "reader", Role::User).await;
    let story_id = story(&state, &author, "Half Gone").await;
    let chapter_id = chapter(&state, story_id, "One").await;

    state
        .bookshelf_service
        .add(reader.id, story_id, None)
        .await
        .unwrap();

    // Break the comments stage, which runs between bookshelf and chapters.
    state
        .store
        .conn
        .execute_unprepared("DROP TABLE comments")
        .await
        .unwrap();

    let err = state.story_service.delete_story(story_id).await.unwrap_err();
    assert!(matches!(err, ContentError::Store(_)));

    // Earlier stages are not rolled back; later ones never ran.
    assert!(
        state
            .store
            .find_bookshelf_entry(reader.id, story_id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(state.store.get_chapter(chapter_id).await.unwrap().is_some());

    let kept = state.store.get_story(story_id).await.unwrap();
    assert!(kept.is_some());
    assert_eq!(kept.unwrap().chapters_count, 1);
}

#[tokio::test]
async fn author_delete_requires_ban_and_ownership() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let rival = user_with_role(&state, "rival", Role::Author).await;
    let admin = user_with_role(&state, "boss", Role::Admin).await;
    story(&state, &author, "Pending").await;

    let err = state
        .story_service
        .delete_story_by_author(&author, "Pending")
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Forbidden(_)));

    state.story_service.ban_story("Pending").await.unwrap();

    for caller in [&rival, &admin] {
        let err = state
            .story_service
            .delete_story_by_author(caller, "Pending")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Forbidden(_)));
    }

    state
        .story_service
        .delete_story_by_author(&author, "Pending")
        .await
        .unwrap();
    assert!(
        state
            .store
            .get_story_by_title("Pending")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn story_titles_are_unique_and_featuring_is_admin_only() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let admin = user_with_role(&state, "boss", Role::Admin).await;
    let story_id = story(&state, &author, "Unique").await;

    let err = state
        .story_service
        .create_story(
            &author,
            NewStory {
                title: "  Unique ".to_string(),
                ..NewStory::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Conflict(_)));

    let err = state
        .story_service
        .update_story(
            &author,
            story_id,
            StoryChanges {
                is_featured: Some(true),
                ..StoryChanges::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Forbidden(_)));

    let updated = state
        .story_service
        .update_story(
            &admin,
            story_id,
            StoryChanges {
                is_featured: Some(true),
                ..StoryChanges::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.is_featured);
    assert_eq!(updated.author, "writer");
}

#[tokio::test]
async fn comments_check_their_targets() {
    let (state, _db) = shared_state().await;
    let author = user_with_role(&state, "writer", Role::Author).await;
    let reader = user_with_role(&state, "reader", Role::User).await;
    let story_id = story(&state, &author, "Chatty").await;
    let other_id = story(&state, &author, "Quiet").await;
    let chapter_id = chapter(&state, story_id, "One").await;

    let err = state
        .comment_service
        .add_comment(&reader, other_id, chapter_id, "wrong story")
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));

    let err = state
        .comment_service
        .add_comment(&reader, story_id, Uuid::new_v4(), "no chapter")
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound(_)));

    let err = state
        .comment_service
        .add_comment(&reader, story_id, chapter_id, &"x".repeat(1001))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));

    let comment = state
        .comment_service
        .add_comment(&reader, story_id, chapter_id, "  hello  ")
        .await
        .unwrap();
    assert_eq!(comment.content, "hello");
    assert_eq!(comment.user_id, reader.id);

    let (items, total) = state
        .comment_service
        .list_comments(Uuid::new_v4(), Page::default())
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn guard_authenticates_against_live_account_state() {
    let (state, _db) = shared_state().await;
    let reader = user_with_role(&state, "reader", Role::User).await;

    let err = state.guard.authenticate(None).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingToken));

    let err = state.guard.authenticate(Some("  ")).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingToken));

    let err = state
        .guard
        .authenticate(Some("definitely.not.valid"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));

    let token = state
        .tokens
        .issue(reader.id, &reader.username, Role::User)
        .unwrap();
    let identity = state.guard.authenticate(Some(&token)).await.unwrap();
    assert_eq!(identity, reader);

    // Role changes apply to tokens issued before them.
    state
        .auth_service
        .set_role("reader", Role::Author)
        .await
        .unwrap();
    let identity = state.guard.authenticate(Some(&token)).await.unwrap();
    assert_eq!(identity.role, Role::Author);

    state
        .auth_service
        .set_status("reader", novelshelf::domain::UserStatus::Banned)
        .await
        .unwrap();
    let err = state.guard.authenticate(Some(&token)).await.unwrap_err();
    assert!(matches!(err, AuthError::Forbidden(_)));

    let ghost = state
        .tokens
        .issue(Uuid::new_v4(), "ghost", Role::Admin)
        .unwrap();
    let err = state.guard.authenticate(Some(&ghost)).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized(_)));
}

#[tokio::test]
async fn guard_ownership_checks() {
    let (state, _db) = shared_state().await;
    let owner = user_with_role(&state, "owner", Role::Author).await;
    let stranger = user_with_role(&state, "stranger", Role::User).await;
    let admin = user_with_role(&state, "boss", Role::Admin).await;
    let story_id = story(&state, &owner, "Mine").await;
    let chapter_id = chapter(&state, story_id, "One").await;

    assert!(
        state
            .guard
            .authorize_owner_of_story(&owner, &StoryRef::Title("Mine".to_string()))
            .await
            .unwrap()
    );
    assert!(
        !state
            .guard
            .authorize_owner_of_story(&stranger, &StoryRef::Id(story_id))
            .await
            .unwrap()
    );
    assert!(
        state
            .guard
            .authorize_owner_of_story(&admin, &StoryRef::Id(story_id))
            .await
            .unwrap()
    );

    assert!(
        !state
            .guard
            .authorize_owner_of_chapter(&stranger, chapter_id)
            .await
            .unwrap()
    );
    assert!(
        state
            .guard
            .authorize_owner_of_chapter(&admin, chapter_id)
            .await
            .unwrap()
    );

    let err = state
        .guard
        .require_owner_of_chapter(&stranger, chapter_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden(_)));

    let err = state
        .guard
        .authorize_owner_of_chapter(&owner, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));

    let err = state
        .guard
        .authorize_owner_of_story(&owner, &StoryRef::Title("Nope".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));

    assert!(state.guard.authorize_role(&owner, &[Role::Author]));
    assert!(!state.guard.authorize_role(&stranger, &[Role::Author]));
    assert!(state.guard.authorize_role(&admin, &[Role::Author]));
}

#[tokio::test]
async fn follow_up_on_missing_story_is_reported_not_raised() {
    let (state, _db) = shared_state().await;
    let follow_ups = FollowUps::new(state.store.clone());

    let outcome = follow_ups
        .apply(SecondaryWrite::AdjustChapterCount {
            story_id: Uuid::new_v4(),
            delta: 1,
        })
        .await;
    assert_eq!(outcome, FollowUpOutcome::Missed);

    let author = user_with_role(&state, "writer", Role::Author).await;
    let story_id = story(&state, &author, "Tracked").await;
    let outcome = follow_ups
        .apply(SecondaryWrite::RecordStoryView { story_id })
        .await;
    assert_eq!(outcome, FollowUpOutcome::Applied);
    assert_eq!(
        state
            .store
            .get_story(story_id)
            .await
            .unwrap()
            .unwrap()
            .view_count,
        1
    );
}
