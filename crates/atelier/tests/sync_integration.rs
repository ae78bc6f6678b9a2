//! End-to-end entity and combined sync runs against an in-memory database.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use atelier::entity::prelude::*;
use atelier::sync::{
    ProgressCallback, SyncContext, SyncError, SyncOptions, SyncProgress, sync_all, sync_artists,
    sync_artworks, sync_contacts,
};
use atelier::upstream::{EntityKind, SortOrder};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{FakeGallery, artist, artwork, contact, fast, setup, ts};

fn offsets(api: &FakeGallery, kind: EntityKind) -> Vec<u64> {
    api.list_calls()
        .into_iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, p)| p.offset)
        .collect()
}

#[tokio::test]
async fn full_sync_walks_every_page_and_enriches_records() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20)), artwork(3, ts(30))]);
    let ctx = setup(&api).await;

    let result = sync_artworks(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect("sync");

    assert_eq!((result.processed, result.created, result.updated), (3, 3, 0));
    assert_eq!(result.skipped, 0);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.last_offset, 4);
    assert!(!result.interrupted);

    let calls = api.list_calls();
    assert_eq!(offsets(&api, EntityKind::Artworks), vec![0, 2]);
    assert!(calls.iter().all(|(_, p)| p.order == SortOrder::Asc && p.limit == 2));

    let rows = Artwork::find().all(ctx.db()).await.unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert!(row.detail_synced_at.is_some(), "artwork {} lacks detail", row.id);
        assert_eq!(row.description.as_deref(), Some(format!("About artwork {}", row.id).as_str()));
    }
    assert_eq!(ArtworkArtist::find().count(ctx.db()).await.unwrap(), 3);
    assert_eq!(ArtworkExtended::find().count(ctx.db()).await.unwrap(), 3);
}

#[tokio::test]
async fn two_full_pages_stop_when_has_more_turns_false() {
    let api = FakeGallery::new();
    api.add_artworks((1..=4).map(|i| artwork(i, ts(i * 10))));
    let ctx = setup(&api).await;

    let pages = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = Arc::clone(&pages);
    let on_progress: ProgressCallback = Box::new(move |event| {
        if let SyncProgress::FetchedPage { count, total, .. } = event {
            seen.lock().unwrap().push((count, total));
        }
    });

    let result = sync_artworks(&ctx, &fast(SyncOptions::full()), Some(&on_progress))
        .await
        .expect("sync");

    // Page 1 reports has_more, page 2 does not, so no third request is made.
    assert_eq!(offsets(&api, EntityKind::Artworks), vec![0, 2]);
    assert_eq!(*pages.lock().unwrap(), vec![(2, 4), (2, 4)]);
    assert_eq!((result.processed, result.created, result.updated), (4, 4, 0));

    let mut detailed = api.detail_calls(EntityKind::Artworks);
    detailed.sort_unstable();
    assert_eq!(detailed, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn rerunning_a_full_sync_updates_without_duplicating() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20)), artwork(3, ts(30))]);
    let ctx = setup(&api).await;
    let options = fast(SyncOptions::full());

    sync_artworks(&ctx, &options, None).await.expect("first sync");
    let second = sync_artworks(&ctx, &options, None).await.expect("second sync");

    assert_eq!((second.processed, second.created, second.updated), (3, 0, 3));
    assert_eq!(Artwork::find().count(ctx.db()).await.unwrap(), 3);
    assert_eq!(ArtworkArtist::find().count(ctx.db()).await.unwrap(), 3);
    assert_eq!(ArtworkExtended::find().count(ctx.db()).await.unwrap(), 3);
}

#[tokio::test]
async fn list_upserts_keep_previously_fetched_details() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    let ctx = setup(&api).await;
    let options = fast(SyncOptions::full());

    sync_artworks(&ctx, &options, None).await.expect("first sync");
    api.fail_detail(EntityKind::Artworks, 1);
    let second = sync_artworks(&ctx, &options, None).await.expect("second sync");

    assert_eq!(second.errors.len(), 1);
    let row = Artwork::find_by_id(1).one(ctx.db()).await.unwrap().unwrap();
    assert_eq!(row.description.as_deref(), Some("About artwork 1"));
    assert!(row.detail_synced_at.is_some());
}

#[tokio::test]
async fn incremental_sync_stops_at_the_first_stale_page() {
    let api = FakeGallery::new();
    api.add_artworks((1..=8).map(|i| artwork(i, ts(i * 10))));
    let ctx = setup(&api).await;

    // Pages (desc): [80, 70] [60, 50] [40, 30] [20, 10]. The second page
    // straddles the cutoff, the third is entirely before it.
    let options = fast(SyncOptions::incremental().with_cutoff(ts(55)));
    let result = sync_artworks(&ctx, &options, None).await.expect("sync");

    assert_eq!(offsets(&api, EntityKind::Artworks), vec![0, 2, 4]);
    assert!(api.list_calls().iter().all(|(_, p)| p.order == SortOrder::Desc));
    assert_eq!((result.processed, result.created), (3, 3));
    assert_eq!(result.skipped, 3);

    let mut ids: Vec<i64> = Artwork::find()
        .all(ctx.db())
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![6, 7, 8]);
}

#[tokio::test]
async fn records_exactly_at_the_cutoff_are_skipped() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20))]);
    let ctx = setup(&api).await;

    let options = fast(SyncOptions::incremental().with_cutoff(ts(10)));
    let result = sync_artworks(&ctx, &options, None).await.expect("sync");

    assert_eq!(result.processed, 1);
    assert_eq!(result.skipped, 1);
    assert!(Artwork::find_by_id(1).one(ctx.db()).await.unwrap().is_none());
}

#[tokio::test]
async fn incremental_without_history_walks_the_whole_listing() {
    let api = FakeGallery::new();
    api.add_contacts((1..=3).map(|i| contact(i, ts(i))));
    let ctx = setup(&api).await;

    let result = sync_contacts(&ctx, &fast(SyncOptions::incremental()), None)
        .await
        .expect("sync");

    assert_eq!(result.processed, 3);
    assert_eq!(offsets(&api, EntityKind::Contacts), vec![0, 2]);
    assert!(api.list_calls().iter().all(|(_, p)| p.order == SortOrder::Asc));

    let stored = Contact::find_by_id(2).one(ctx.db()).await.unwrap().unwrap();
    assert_eq!(stored.email.as_deref(), Some("collector2@example.com"));
    assert_eq!(stored.notes.as_deref(), Some("Met contact 2"));
}

#[tokio::test]
async fn detail_backlog_is_retried_on_the_next_run() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20)), artwork(3, ts(30))]);
    api.fail_detail(EntityKind::Artworks, 2);
    let ctx = setup(&api).await;

    let first = sync_artworks(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect("first sync");
    assert_eq!(first.processed, 3);
    assert_eq!(first.errors.len(), 1);
    assert!(first.errors[0].starts_with("Artwork detail: #2 "), "{}", first.errors[0]);

    let pending = Artwork::find()
        .filter(ArtworkColumn::DetailSyncedAt.is_null())
        .count(ctx.db())
        .await
        .unwrap();
    assert_eq!(pending, 1);

    api.heal();
    api.clear_calls();

    // Nothing changed upstream since the cutoff; only the backlog is worked.
    let options = fast(SyncOptions::incremental().with_cutoff(ts(100)));
    let second = sync_artworks(&ctx, &options, None).await.expect("second sync");

    assert_eq!(second.processed, 0);
    assert_eq!(offsets(&api, EntityKind::Artworks), vec![0]);
    assert_eq!(api.detail_calls(EntityKind::Artworks), vec![2]);
    assert!(second.errors.is_empty());

    let pending = Artwork::find()
        .filter(ArtworkColumn::DetailSyncedAt.is_null())
        .count(ctx.db())
        .await
        .unwrap();
    assert_eq!(pending, 0);
}

#[tokio::test]
async fn one_bad_record_does_not_sink_its_neighbours() {
    let api = FakeGallery::new();
    let mut untitled = artwork(2, ts(20));
    untitled.title = "  ".to_string();
    api.add_artworks([artwork(1, ts(10)), untitled, artwork(3, ts(30))]);
    let ctx = setup(&api).await;

    let result = sync_artworks(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect("sync");

    assert_eq!((result.processed, result.created), (2, 2));
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Artwork 2: "), "{}", result.errors[0]);
    assert!(Artwork::find_by_id(2).one(ctx.db()).await.unwrap().is_none());
    assert!(!api.detail_calls(EntityKind::Artworks).contains(&2));
}

#[tokio::test]
async fn throttled_detail_fetches_back_off_and_recover() {
    let api = FakeGallery::new();
    api.add_artists([artist(1, ts(10)), artist(2, ts(20))]);
    api.throttle_detail(EntityKind::Artists, 1, 2);
    let ctx = setup(&api).await;

    let result = sync_artists(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect("sync");

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let calls = api.detail_calls(EntityKind::Artists);
    assert_eq!(calls.iter().filter(|id| **id == 1).count(), 3);
    assert_eq!(calls.iter().filter(|id| **id == 2).count(), 1);

    let stored = Artist::find_by_id(1).one(ctx.db()).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ada Painter1");
    assert_eq!(stored.biography.as_deref(), Some("Biography 1"));
}

#[tokio::test]
async fn exhausted_rate_limits_become_record_errors() {
    let api = FakeGallery::new();
    api.add_artists([artist(1, ts(10))]);
    api.throttle_detail(EntityKind::Artists, 1, 10);
    let ctx = setup(&api).await;

    let result = sync_artists(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect("sync");

    assert_eq!(result.processed, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("max retries exceeded"), "{}", result.errors[0]);
    assert_eq!(api.detail_calls(EntityKind::Artists).len(), 3);
}

#[tokio::test]
async fn list_failures_are_fatal_for_the_entity() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    api.fail_list(EntityKind::Artworks);
    let ctx = setup(&api).await;

    let err = sync_artworks(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect_err("listing fails");

    assert!(matches!(
        err,
        SyncError::Upstream {
            entity: EntityKind::Artworks,
            ..
        }
    ));
    assert_eq!(Artwork::find().count(ctx.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn sync_all_runs_entities_in_order() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    api.add_artists([artist(1, ts(10)), artist(2, ts(20))]);
    api.add_contacts([contact(1, ts(10))]);
    let ctx = setup(&api).await;

    let all = sync_all(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect("sync all");

    let order: Vec<EntityKind> = all.entities.iter().map(|(k, _)| *k).collect();
    assert_eq!(order, EntityKind::ALL.to_vec());
    assert_eq!(all.get(EntityKind::Artists).map(|r| r.processed), Some(2));
    assert_eq!(all.totals().processed, 4);

    let listed: Vec<EntityKind> = api.list_calls().into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        listed,
        vec![EntityKind::Artworks, EntityKind::Artists, EntityKind::Contacts]
    );
}

#[tokio::test]
async fn sync_all_aborts_at_the_failing_entity() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20))]);
    api.add_artists([artist(1, ts(10))]);
    api.add_contacts([contact(1, ts(10))]);
    api.fail_list(EntityKind::Artists);
    let ctx = setup(&api).await;

    let err = sync_all(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect_err("artists fail");

    match &err {
        SyncError::Aborted {
            entity, completed, ..
        } => {
            assert_eq!(*entity, EntityKind::Artists);
            assert_eq!(completed.len(), 1);
            assert_eq!(completed[0].0, EntityKind::Artworks);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.partial_counts(), (2, 2, 0));
    assert!(offsets(&api, EntityKind::Contacts).is_empty());
    assert_eq!(Artwork::find().count(ctx.db()).await.unwrap(), 2);
}

/// Request a pause as soon as `when` matches an event.
fn pause_on(ctx: &SyncContext, when: fn(&SyncProgress) -> bool) -> ProgressCallback {
    let flag = Arc::clone(ctx.stop_flag());
    Box::new(move |event| {
        if when(&event) {
            flag.store(true, Ordering::SeqCst);
        }
    })
}

#[tokio::test]
async fn pausing_between_pages_resumes_without_losing_records() {
    let api = FakeGallery::new();
    api.add_artworks((1..=6).map(|i| artwork(i, ts(i))));
    let ctx = setup(&api).await;

    let on_progress = pause_on(&ctx, |e| matches!(e, SyncProgress::FetchedPage { page: 1, .. }));
    let paused = sync_artworks(&ctx, &fast(SyncOptions::full()), Some(&on_progress))
        .await
        .expect("paused sync");
    assert!(paused.interrupted);
    assert_eq!(paused.processed, 0);
    assert_eq!(paused.last_offset, 0);

    ctx.reset_stop();
    api.clear_calls();

    let options = fast(SyncOptions::full().with_resume_offset(paused.last_offset));
    let resumed = sync_artworks(&ctx, &options, None).await.expect("resumed sync");

    assert_eq!(offsets(&api, EntityKind::Artworks), vec![0, 2, 4]);
    assert_eq!(resumed.processed, 6);
    assert!(!resumed.interrupted);
    assert_eq!(Artwork::find().count(ctx.db()).await.unwrap(), 6);
}

#[tokio::test]
async fn pausing_after_the_fetch_resumes_from_the_first_unstored_record() {
    let api = FakeGallery::new();
    api.add_artworks((1..=6).map(|i| artwork(i, ts(i))));
    let ctx = setup(&api).await;

    let on_progress = pause_on(&ctx, |e| matches!(e, SyncProgress::FetchComplete { .. }));
    let paused = sync_artworks(&ctx, &fast(SyncOptions::full()), Some(&on_progress))
        .await
        .expect("paused sync");
    assert!(paused.interrupted);
    assert_eq!(paused.processed, 0);
    assert_eq!(paused.last_offset, 0);

    ctx.reset_stop();
    let options = fast(SyncOptions::full().with_resume_offset(paused.last_offset));
    sync_artworks(&ctx, &options, None).await.expect("resumed sync");

    assert_eq!(Artwork::find().count(ctx.db()).await.unwrap(), 6);
}

#[tokio::test]
async fn pausing_mid_upsert_resumes_at_the_next_record() {
    let api = FakeGallery::new();
    let mut untitled = artwork(3, ts(3));
    untitled.title = String::new();
    api.add_artworks((1..=6).map(|i| if i == 3 { untitled.clone() } else { artwork(i, ts(i)) }));
    let ctx = setup(&api).await;

    // Record 3 fails; the pause lands before record 4.
    let on_progress = pause_on(&ctx, |e| matches!(e, SyncProgress::UpsertError { id: 3, .. }));
    let paused = sync_artworks(&ctx, &fast(SyncOptions::full()), Some(&on_progress))
        .await
        .expect("paused sync");
    assert!(paused.interrupted);
    assert_eq!(paused.processed, 2);
    assert_eq!(paused.errors.len(), 1);
    assert_eq!(paused.last_offset, 3);

    ctx.reset_stop();
    api.clear_calls();

    let options = fast(SyncOptions::full().with_resume_offset(paused.last_offset));
    let resumed = sync_artworks(&ctx, &options, None).await.expect("resumed sync");

    assert_eq!(offsets(&api, EntityKind::Artworks), vec![3, 5]);
    assert_eq!(resumed.processed, 3);
    let mut ids: Vec<i64> = Artwork::find()
        .all(ctx.db())
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 4, 5, 6]);
}

#[tokio::test]
async fn pause_before_start_skips_every_entity() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    let ctx = setup(&api).await;
    ctx.request_stop();

    let all = sync_all(&ctx, &fast(SyncOptions::full()), None)
        .await
        .expect("sync all");

    assert!(all.interrupted);
    assert!(all.entities.is_empty());
    assert!(api.list_calls().is_empty());
}

#[tokio::test]
async fn progress_reports_every_ten_records_and_the_last() {
    let api = FakeGallery::new();
    api.add_contacts((1..=12).map(|i| contact(i, ts(i))));
    let ctx = setup(&api).await;

    let upserting = Arc::new(std::sync::Mutex::new(Vec::new()));
    let pages = Arc::new(AtomicUsize::new(0));
    let (seen, page_count) = (Arc::clone(&upserting), Arc::clone(&pages));
    let on_progress: ProgressCallback = Box::new(move |event| match event {
        SyncProgress::Upserting { processed, .. } => seen.lock().unwrap().push(processed),
        SyncProgress::FetchedPage { .. } => {
            page_count.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    });

    let options = SyncOptions::full()
        .with_page_size(5)
        .with_detail(fast(SyncOptions::full()).detail);
    let result = sync_contacts(&ctx, &options, Some(&on_progress))
        .await
        .expect("sync");

    assert_eq!(result.processed, 12);
    assert_eq!(*upserting.lock().unwrap(), vec![10, 12]);
    assert_eq!(pages.load(Ordering::SeqCst), 3);
}
