mod common;

use chrono::{Duration, Utc};
use common::{count_mailboxes, count_messages, count_messages_for, seed_mailbox, test_state};
use driftmail::{
    models::message::{Direction, NewMessage},
    store,
    sweep::{SweepConfig, run_sweep},
};
use uuid::Uuid;

async fn seed_message(pool: &sqlx::SqlitePool, mailbox_id: Uuid, subject: &str) {
    store::insert_message(
        pool,
        NewMessage {
            mailbox_id,
            from_addr: "sender@example.test".to_string(),
            subject: Some(subject.to_string()),
            text: Some("body".to_string()),
            html: None,
            direction: Direction::Received,
        },
    )
    .await
    .expect("seed message");
}

#[tokio::test]
async fn sweep_removes_expired_mailboxes_and_their_messages() {
    let state = test_state().await;
    let expired = seed_mailbox(&state.db, "old@x.test", "u1", Utc::now() - Duration::hours(1)).await;
    let live = seed_mailbox(&state.db, "new@x.test", "u2", Utc::now() + Duration::hours(1)).await;
    for subject in ["a", "b", "c"] {
        seed_message(&state.db, expired, subject).await;
    }
    seed_message(&state.db, live, "keep").await;

    let report = run_sweep(&state.db, &SweepConfig::default(), Utc::now())
        .await
        .expect("sweep");
    assert_eq!(report.mailboxes_deleted, 1);
    assert_eq!(report.messages_deleted, 3);

    // Nothing of the expired mailbox remains, the live one is untouched.
    assert_eq!(count_messages_for(&state.db, expired).await, 0);
    assert_eq!(count_mailboxes(&state.db).await, 1);
    assert_eq!(count_messages_for(&state.db, live).await, 1);
}

#[tokio::test]
async fn sweep_twice_is_a_noop_on_the_second_run() {
    let state = test_state().await;
    let expired = seed_mailbox(&state.db, "old@x.test", "u1", Utc::now() - Duration::hours(1)).await;
    seed_message(&state.db, expired, "a").await;

    let config = SweepConfig::default();
    let first = run_sweep(&state.db, &config, Utc::now()).await.expect("sweep");
    assert_eq!(first.mailboxes_deleted, 1);

    let second = run_sweep(&state.db, &config, Utc::now()).await.expect("sweep");
    assert_eq!(second.mailboxes_deleted, 0);
    assert_eq!(second.messages_deleted, 0);
}

#[tokio::test]
async fn batch_cap_bounds_each_invocation() {
    let state = test_state().await;
    for i in 0..5 {
        seed_mailbox(
            &state.db,
            &format!("old{i}@x.test"),
            "u1",
            Utc::now() - Duration::hours(1),
        )
        .await;
    }

    let config = SweepConfig {
        batch_size: 2,
        ..SweepConfig::default()
    };
    let mut deleted = Vec::new();
    for _ in 0..4 {
        let report = run_sweep(&state.db, &config, Utc::now()).await.expect("sweep");
        deleted.push(report.mailboxes_deleted);
    }
    // Completion spans multiple invocations, never exceeding the cap.
    assert_eq!(deleted, vec![2, 2, 1, 0]);
    assert_eq!(count_mailboxes(&state.db).await, 0);
}

#[tokio::test]
async fn retained_mailboxes_keep_their_row_but_lose_messages() {
    let state = test_state().await;
    let expired = seed_mailbox(&state.db, "old@x.test", "u1", Utc::now() - Duration::hours(1)).await;
    seed_message(&state.db, expired, "a").await;
    seed_message(&state.db, expired, "b").await;

    let config = SweepConfig {
        retain_expired_mailboxes: true,
        ..SweepConfig::default()
    };
    let report = run_sweep(&state.db, &config, Utc::now()).await.expect("sweep");
    assert_eq!(report.mailboxes_deleted, 0);
    assert_eq!(report.messages_deleted, 2);
    assert_eq!(count_mailboxes(&state.db).await, 1);
    assert_eq!(count_messages(&state.db).await, 0);

    // The retained mailbox is re-selected every cycle as an empty no-op.
    let again = run_sweep(&state.db, &config, Utc::now()).await.expect("sweep");
    assert_eq!(again.messages_deleted, 0);
    assert_eq!(count_mailboxes(&state.db).await, 1);
}

#[tokio::test]
async fn unexpired_mailboxes_are_never_selected() {
    let state = test_state().await;
    let live = seed_mailbox(&state.db, "new@x.test", "u1", Utc::now() + Duration::hours(1)).await;
    seed_message(&state.db, live, "keep").await;

    let report = run_sweep(&state.db, &SweepConfig::default(), Utc::now())
        .await
        .expect("sweep");
    assert_eq!(report, Default::default());
    assert_eq!(count_messages_for(&state.db, live).await, 1);
}
