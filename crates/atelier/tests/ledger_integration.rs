//! Ledger-wrapped runs: cutoffs, leases and failure bookkeeping.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod common;

use std::sync::{Arc, Mutex};

use atelier::entity::prelude::*;
use atelier::store::ledger;
use atelier::sync::{ProgressCallback, SyncError, SyncOptions, SyncProgress, SyncTarget, run_sync};
use atelier::upstream::EntityKind;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use common::{FakeGallery, artist, artwork, contact, fast, setup, ts};

#[tokio::test]
async fn completed_runs_are_recorded_with_counts() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20))]);
    let ctx = setup(&api).await;

    let report = run_sync(
        &ctx,
        SyncTarget::Entity(EntityKind::Artworks),
        &fast(SyncOptions::full()),
        "test",
        None,
    )
    .await
    .expect("run");

    assert_eq!(report.status, SyncStatus::Completed);
    assert_eq!(report.scope, "artworks");
    assert_eq!((report.processed, report.created), (2, 2));

    let row = SyncLog::find_by_id(report.run_id)
        .one(ctx.db())
        .await
        .unwrap()
        .expect("ledger row");
    assert_eq!(row.status, SyncStatus::Completed);
    assert_eq!(row.entity_type, "artworks");
    assert_eq!(row.direction, SyncDirection::Pull);
    assert_eq!((row.records_processed, row.records_created, row.records_updated), (2, 2, 0));
    assert_eq!(row.triggered_by.as_deref(), Some("test"));
    assert!(row.error.is_none());
    assert!(row.completed_at.is_some());
}

#[tokio::test]
async fn next_incremental_run_starts_from_the_last_completed_run() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20))]);
    let ctx = setup(&api).await;
    let target = SyncTarget::Entity(EntityKind::Artworks);

    run_sync(&ctx, target, &fast(SyncOptions::full()), "test", None)
        .await
        .expect("full run");
    let cutoff = ledger::last_completed_at(ctx.db(), "artworks")
        .await
        .unwrap()
        .expect("cutoff");

    api.add_artworks([artwork(3, cutoff + Duration::hours(1))]);
    let report = run_sync(&ctx, target, &fast(SyncOptions::incremental()), "test", None)
        .await
        .expect("incremental run");

    assert_eq!((report.processed, report.created, report.updated), (1, 1, 0));
    assert_eq!(report.skipped, 2);

    let runs = ledger::recent_runs(ctx.db(), Some("artworks"), 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status == SyncStatus::Completed));
}

#[tokio::test]
async fn combined_runs_use_their_own_scope() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    api.add_artists([artist(1, ts(10))]);
    api.add_contacts([contact(1, ts(10))]);
    let ctx = setup(&api).await;

    let report = run_sync(&ctx, SyncTarget::All, &fast(SyncOptions::full()), "test", None)
        .await
        .expect("run");

    assert_eq!(report.scope, "all");
    assert_eq!(report.processed, 3);
    assert_eq!(report.entities.len(), 3);
    assert!(ledger::last_completed_at(ctx.db(), "all").await.unwrap().is_some());
    assert!(ledger::last_completed_at(ctx.db(), "artworks").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_runs_record_the_error_and_partial_counts() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    api.add_artists([artist(1, ts(10))]);
    api.fail_list(EntityKind::Contacts);
    let ctx = setup(&api).await;

    let err = run_sync(&ctx, SyncTarget::All, &fast(SyncOptions::full()), "test", None)
        .await
        .expect_err("contacts fail");
    assert!(matches!(err, SyncError::Aborted { .. }));

    let runs = ledger::recent_runs(ctx.db(), Some("all"), 1).await.unwrap();
    let row = runs.first().expect("ledger row");
    assert_eq!(row.status, SyncStatus::Error);
    assert_eq!(row.records_processed, 2);
    assert!(row.error.as_deref().unwrap_or_default().contains("contacts listing failed"));
    assert!(ledger::last_completed_at(ctx.db(), "all").await.unwrap().is_none());
}

#[tokio::test]
async fn record_errors_are_summarized_on_a_completed_run() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10)), artwork(2, ts(20))]);
    api.fail_detail(EntityKind::Artworks, 1);
    let ctx = setup(&api).await;

    let report = run_sync(
        &ctx,
        SyncTarget::Entity(EntityKind::Artworks),
        &fast(SyncOptions::full()),
        "test",
        None,
    )
    .await
    .expect("run");

    assert_eq!(report.status, SyncStatus::Completed);
    let row = SyncLog::find_by_id(report.run_id).one(ctx.db()).await.unwrap().unwrap();
    let summary = row.error.expect("summary");
    assert!(summary.starts_with("1 errors: Artwork detail: #1 "), "{summary}");
}

#[tokio::test]
async fn paused_runs_are_cancelled_and_give_no_cutoff() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    let ctx = setup(&api).await;
    ctx.request_stop();

    let report = run_sync(
        &ctx,
        SyncTarget::Entity(EntityKind::Artworks),
        &fast(SyncOptions::full()),
        "test",
        None,
    )
    .await
    .expect("run");

    assert_eq!(report.status, SyncStatus::Cancelled);
    let row = SyncLog::find_by_id(report.run_id).one(ctx.db()).await.unwrap().unwrap();
    assert_eq!(row.status, SyncStatus::Cancelled);
    assert!(ledger::last_completed_at(ctx.db(), "artworks").await.unwrap().is_none());
}

#[tokio::test]
async fn a_live_run_blocks_a_second_one_unless_forced() {
    let api = FakeGallery::new();
    api.add_artworks([artwork(1, ts(10))]);
    let ctx = setup(&api).await;
    let target = SyncTarget::Entity(EntityKind::Artworks);

    let live = ledger::start_run(ctx.db(), "artworks", Some("other"))
        .await
        .unwrap();

    let err = run_sync(&ctx, target, &fast(SyncOptions::full()), "test", None)
        .await
        .expect_err("lease held");
    match err {
        SyncError::AlreadyRunning { scope, run_id, .. } => {
            assert_eq!(scope, "artworks");
            assert_eq!(run_id, live.id);
        }
        other => panic!("unexpected error: {other}"),
    }

    let forced = run_sync(
        &ctx,
        target,
        &fast(SyncOptions::full()).with_force(true),
        "test",
        None,
    )
    .await
    .expect("forced run");
    assert_eq!(forced.status, SyncStatus::Completed);

    // Other scopes are unaffected.
    run_sync(
        &ctx,
        SyncTarget::Entity(EntityKind::Artists),
        &fast(SyncOptions::full()),
        "test",
        None,
    )
    .await
    .expect("artists run");
}

#[tokio::test]
async fn abandoned_runs_are_expired_before_starting() {
    let api = FakeGallery::new();
    let ctx = setup(&api).await;

    let stale_id = Uuid::new_v4();
    SyncLogActiveModel {
        id: Set(stale_id),
        entity_type: Set("contacts".to_string()),
        direction: Set(SyncDirection::Pull),
        status: Set(SyncStatus::Running),
        records_processed: Set(0),
        records_created: Set(0),
        records_updated: Set(0),
        error: Set(None),
        started_at: Set((Utc::now() - Duration::hours(2)).fixed_offset()),
        completed_at: Set(None),
        triggered_by: Set(Some("crashed".to_string())),
    }
    .insert(ctx.db())
    .await
    .unwrap();

    let warnings = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&warnings);
    let on_progress: ProgressCallback = Box::new(move |event| {
        if let SyncProgress::Warning { message } = event {
            seen.lock().unwrap().push(message);
        }
    });

    let report = run_sync(
        &ctx,
        SyncTarget::Entity(EntityKind::Contacts),
        &fast(SyncOptions::full()),
        "test",
        Some(&on_progress),
    )
    .await
    .expect("run");
    assert_eq!(report.status, SyncStatus::Completed);
    assert_eq!(
        *warnings.lock().unwrap(),
        vec!["expired 1 abandoned contacts run(s)".to_string()]
    );

    let stale = SyncLog::find_by_id(stale_id).one(ctx.db()).await.unwrap().unwrap();
    assert_eq!(stale.status, SyncStatus::Error);
    assert_eq!(stale.error.as_deref(), Some("abandoned: run never finished"));
    assert!(stale.completed_at.is_some());
}
