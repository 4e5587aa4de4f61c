// End-to-end runs of the diary library against a real store: the
// SQLite repository, the filesystem image bucket and the entry
// workflow working together.

use bytes::Bytes;
use chrono::NaiveDate;
use hatake::db;
use hatake::device::{DeviceStore, JsonDeviceStore};
use hatake::journal::timeline;
use hatake::journal::{
    Author, EntryState, EntryWorkflow, NewImage, PostRepository, RepositoryError,
    SqlitePostRepository,
};
use hatake::storage::FsImageStore;
use std::sync::Arc;
use tempfile::TempDir;

fn open_diary() -> (SqlitePostRepository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let images = Arc::new(FsImageStore::new(temp_dir.path().join("images")));
    (SqlitePostRepository::new(pool, images), temp_dir)
}

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_simultaneous_saves_one_wins() {
    let (repo, _temp) = open_diary();
    let date = day("2024-06-01");

    // Two devices, same author, same day, racing each other.
    let (a, b) = tokio::join!(
        repo.create_post(date, Author::Father, Some("リビングから".to_string()), None),
        repo.create_post(date, Author::Father, Some("畑から".to_string()), None),
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1, "Exactly one save should land, got {:?} and {:?}", a, b);

    let loser = if a.is_ok() { b } else { a };
    assert!(
        matches!(loser, Err(RepositoryError::Conflict { .. })),
        "The losing save should be rejected as a conflict"
    );

    // One entry in the store, untouched by the losing attempt.
    let posts = repo.posts_for_date(date).await.expect("Failed to read back");
    assert_eq!(posts.len(), 1);
}

#[tokio::test]
async fn test_workflow_full_day_against_the_real_store() {
    let (repo, temp) = open_diary();
    let device = JsonDeviceStore::load_or_default(temp.path().join("device.json"));
    let today = day("2024-06-01");
    let workflow = EntryWorkflow::new(&repo, &device, Author::Father, today);

    // Morning: nothing saved yet, type a little, then lose the session.
    let state = workflow.open().await.expect("Failed to open the diary");
    assert_eq!(state.state_name(), "NoEntryToday");
    workflow.edit_comment(state, "朝、トマトに水をやった").expect("Failed to edit");

    // A fresh open restores the typed text from the draft.
    let state = workflow.open().await.expect("Failed to reopen");
    assert_eq!(state.editor().unwrap().comment, "朝、トマトに水をやった");

    // Save it. The draft is consumed by the successful save.
    let done = workflow.submit(state).await.expect("Failed to submit");
    match done {
        EntryState::Saved { post, created } => {
            assert!(created, "The first save of the day should count as created");
            assert_eq!(post.comment.as_deref(), Some("朝、トマトに水をやった"));
        }
        other => panic!("expected Saved, got {}", other.state_name()),
    }
    assert_eq!(device.get("draft_father"), None);

    // Evening: reopen, the entry is there, rewrite it in place.
    let state = workflow.open().await.expect("Failed to reopen");
    assert_eq!(state.state_name(), "HasEntryToday");

    let state = workflow.edit_comment(state, "朝と夕方に水をやった").expect("Failed to edit");
    let done = workflow.submit(state).await.expect("Failed to resubmit");
    match done {
        EntryState::Saved { post, created } => {
            assert!(!created, "Rewriting the entry should count as an update");
            assert_eq!(post.comment.as_deref(), Some("朝と夕方に水をやった"));
        }
        other => panic!("expected Saved, got {}", other.state_name()),
    }

    // Still one entry for the day after all of that.
    let posts = repo.posts_for_date(today).await.expect("Failed to read back");
    assert_eq!(posts.len(), 1);
}

#[tokio::test]
async fn test_second_device_save_rejected_then_shown_the_winner() {
    let (repo, temp) = open_diary();
    let today = day("2024-06-01");

    // Each device keeps its own local store.
    let phone = JsonDeviceStore::load_or_default(temp.path().join("phone.json"));
    let tablet = JsonDeviceStore::load_or_default(temp.path().join("tablet.json"));

    let on_phone = EntryWorkflow::new(&repo, &phone, Author::Mother, today);
    let on_tablet = EntryWorkflow::new(&repo, &tablet, Author::Mother, today);

    // Both open before either saves, so both believe the day is free.
    let phone_state = on_phone.open().await.expect("Failed to open on the phone");
    let tablet_state = on_tablet.open().await.expect("Failed to open on the tablet");
    assert_eq!(tablet_state.state_name(), "NoEntryToday");

    // The phone saves first and wins the day.
    let phone_state = on_phone.edit_comment(phone_state, "電話から書いた").unwrap();
    let saved = on_phone.submit(phone_state).await.expect("Failed to submit on the phone");
    assert!(matches!(saved, EntryState::Saved { created: true, .. }));

    // The tablet's save is turned away; the typed text survives as a
    // draft on that device.
    let tablet_state = on_tablet.edit_comment(tablet_state, "タブレットから書いた").unwrap();
    let rejected = on_tablet.submit(tablet_state).await.expect("Failed to submit on the tablet");
    assert_eq!(rejected.state_name(), "ConflictRejected");
    assert_eq!(rejected.editor().unwrap().comment, "タブレットから書いた");
    assert_eq!(tablet.get("draft_mother").as_deref(), Some("タブレットから書いた"));

    // Acknowledging the conflict refetches and shows the entry that won.
    let next = on_tablet.acknowledge(rejected).await.expect("Failed to acknowledge");
    assert_eq!(next.state_name(), "HasEntryToday");
    assert_eq!(next.post().unwrap().comment.as_deref(), Some("電話から書いた"));
}

#[tokio::test]
async fn test_saved_image_lands_in_the_bucket() {
    let (repo, temp) = open_diary();

    let image = NewImage::from_upload("tomatoes.jpg", Bytes::from_static(b"pretend jpeg bytes"))
        .expect("Failed to build the upload");
    let post = repo
        .create_post(day("2024-06-05"), Author::Mother, Some("初収穫".to_string()), Some(image))
        .await
        .expect("Failed to create the post");

    let url = post.image_url.expect("The saved entry should reference its image");
    assert!(url.starts_with("/images/posts/mother_"));
    assert!(url.ends_with(".jpg"));

    // The URL maps straight onto an object under the bucket root.
    let object = temp.path().join("images").join(url.strip_prefix("/images/").unwrap());
    let stored = std::fs::read(&object).expect("The object should exist in the bucket");
    assert_eq!(stored, b"pretend jpeg bytes");
}

#[tokio::test]
async fn test_month_grid_over_the_real_store() {
    let (repo, _temp) = open_diary();

    repo.create_post(day("2024-02-01"), Author::Father, Some("二月の始まり".to_string()), None)
        .await
        .unwrap();
    repo.create_post(day("2024-02-29"), Author::Mother, Some("うるう日".to_string()), None)
        .await
        .unwrap();
    // A neighboring month's entry must stay out of the February range.
    repo.create_post(day("2024-03-01"), Author::Father, None, None).await.unwrap();

    let (first, last) = timeline::month_bounds(2024, 2).unwrap();
    let posts = repo.posts_for_range(first, last).await.expect("Failed to fetch the month");
    assert_eq!(posts.len(), 2);

    let grid = timeline::month_grid(2024, 2, &posts);

    // February 2024 starts on a Thursday: four blank cells, then 29 days.
    assert_eq!(grid.len(), 4 + 29);
    assert_eq!(grid[0].date, None);
    assert_eq!(grid[4].date, Some(day("2024-02-01")));
    assert_eq!(grid[4].posts.len(), 1);

    let leap_day = grid.last().unwrap();
    assert_eq!(leap_day.date, Some(day("2024-02-29")));
    assert_eq!(leap_day.posts[0].comment.as_deref(), Some("うるう日"));
}
