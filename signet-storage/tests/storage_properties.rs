//! Property tests for the invariants the mutation closures must hold
//! regardless of input: version increments exactly once per mutation
//! with exactly one paired history event, soft-delete/recover round
//! trips, and idempotent ingest under a fixed content hash.

use chrono::Utc;
use proptest::prelude::*;

use signet_core::history::{ActorType, MutationContext};
use signet_core::memory::{content_hash, normalize_content, ExtractionStatus, Memory, MemoryKind};
use signet_storage::queries::{history, memory_crud};
use signet_storage::tx;
use signet_storage::Accessor;

fn make_memory(id: &str, content: &str) -> Memory {
    let now = Utc::now();
    let normalized = normalize_content(content);
    let hash = content_hash(&normalized);
    Memory {
        id: id.to_string(),
        content: content.to_string(),
        normalized_content: normalized,
        content_hash: hash,
        memory_type: MemoryKind::Fact,
        tags: vec![],
        importance: 0.5,
        pinned: false,
        is_deleted: false,
        deleted_at: None,
        version: 1,
        access_count: 0,
        last_accessed: None,
        who: Some("prop-test".into()),
        why: None,
        project: None,
        created_at: now,
        updated_at: now,
        updated_by: None,
        source_type: None,
        source_id: None,
        embedding_model: None,
        extraction_status: ExtractionStatus::None,
        extraction_model: None,
    }
}

fn history_count(accessor: &Accessor, memory_id: &str) -> i64 {
    accessor
        .with_read_db(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM memory_history_events WHERE memory_id = ?1",
                [memory_id],
                |r| r.get(0),
            )
            .map_err(|e| signet_core::errors::to_storage_err(e.to_string()))
        })
        .unwrap()
}

proptest! {
    #[test]
    fn prop_ingest_is_idempotent_under_fixed_content_hash(
        content in "[a-zA-Z0-9 ]{1,80}"
    ) {
        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Operator);
        let now = Utc::now();

        let first_id = uuid::Uuid::new_v4().to_string();
        let first = make_memory(&first_id, &content);
        let outcome1 = accessor.with_write_tx(|conn| tx::ingest(conn, first, &ctx, now)).unwrap();
        prop_assert!(matches!(outcome1, tx::IngestOutcome::Inserted(_)));

        let second_id = uuid::Uuid::new_v4().to_string();
        let second = make_memory(&second_id, &content);
        let outcome2 = accessor.with_write_tx(|conn| tx::ingest(conn, second, &ctx, now)).unwrap();
        match outcome2 {
            tx::IngestOutcome::Duplicate(existing) => prop_assert_eq!(existing.id, first_id),
            tx::IngestOutcome::Inserted(_) => prop_assert!(false, "second ingest with identical content should dedupe"),
        }

        let active = accessor.with_read_db(memory_crud::count_active).unwrap();
        prop_assert_eq!(active, 1);
    }

    #[test]
    fn prop_modify_bumps_version_by_one_and_writes_one_history_event(
        initial in "[a-zA-Z0-9 ]{1,40}",
        updated in "[a-zA-Z0-9 ]{1,40}"
    ) {
        prop_assume!(normalize_content(&initial) != normalize_content(&updated));

        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Operator);
        let now = Utc::now();

        let id = uuid::Uuid::new_v4().to_string();
        let memory = make_memory(&id, &initial);
        accessor.with_write_tx(|conn| tx::ingest(conn, memory, &ctx, now)).unwrap();

        let normalized = normalize_content(&updated);
        let hash = content_hash(&normalized);
        let patch = tx::MemoryPatch {
            content: Some(updated.clone()),
            normalized_content: Some(normalized),
            content_hash: Some(hash),
            ..Default::default()
        };
        let outcome = accessor
            .with_write_tx(|conn| tx::modify(conn, &id, patch, Some(1), &ctx, now))
            .unwrap();

        match outcome {
            tx::ModifyOutcome::Updated(m) => prop_assert_eq!(m.version, 2),
            other => prop_assert!(false, "expected Updated, got {other:?}"),
        }
        prop_assert_eq!(history_count(&accessor, &id), 2); // created + updated
    }

    #[test]
    fn prop_forget_then_recover_round_trips_to_active(
        content in "[a-zA-Z0-9 ]{1,60}"
    ) {
        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Operator);
        let now = Utc::now();

        let id = uuid::Uuid::new_v4().to_string();
        let memory = make_memory(&id, &content);
        accessor.with_write_tx(|conn| tx::ingest(conn, memory, &ctx, now)).unwrap();

        let forget_outcome = accessor
            .with_write_tx(|conn| tx::forget(conn, &id, false, None, &ctx, now))
            .unwrap();
        prop_assert_eq!(forget_outcome, tx::ForgetOutcome::Deleted);

        let recover_outcome = accessor
            .with_write_tx(|conn| tx::recover(conn, &id, 30 * 24 * 60 * 60 * 1000, None, &ctx, now))
            .unwrap();
        prop_assert_eq!(recover_outcome, tx::RecoverOutcome::Recovered);

        let fetched = accessor.with_read_db(|conn| memory_crud::get_memory(conn, &id)).unwrap().unwrap();
        prop_assert!(!fetched.is_deleted);
        prop_assert_eq!(fetched.version, 3); // created -> deleted -> recovered
    }

    #[test]
    fn prop_pinned_memory_requires_force_unless_actor_is_pipeline(
        content in "[a-zA-Z0-9 ]{1,60}"
    ) {
        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Operator);
        let now = Utc::now();

        let id = uuid::Uuid::new_v4().to_string();
        let mut memory = make_memory(&id, &content);
        memory.pinned = true;
        accessor.with_write_tx(|conn| tx::ingest(conn, memory, &ctx, now)).unwrap();

        let denied = accessor
            .with_write_tx(|conn| tx::forget(conn, &id, false, None, &ctx, now))
            .unwrap();
        prop_assert_eq!(denied, tx::ForgetOutcome::PinnedRequiresForce);

        let pipeline_ctx = MutationContext::new(ActorType::Pipeline);
        let pipeline_denied = accessor
            .with_write_tx(|conn| tx::forget(conn, &id, true, None, &pipeline_ctx, now))
            .unwrap();
        prop_assert_eq!(pipeline_denied, tx::ForgetOutcome::AutonomousForceDenied);

        let forced = accessor
            .with_write_tx(|conn| tx::forget(conn, &id, true, None, &ctx, now))
            .unwrap();
        prop_assert_eq!(forced, tx::ForgetOutcome::Deleted);
    }
}

#[test]
fn history_records_for_system_actions_use_the_synthetic_memory_id() {
    let accessor = Accessor::init_in_memory().unwrap();
    let now = Utc::now();
    accessor
        .with_write_tx(|conn| history::record_system_event(conn, "requeueDeadJobs", 3, "repair", "manual trigger", now))
        .unwrap();
    assert_eq!(history_count(&accessor, "system"), 1);
}

#[test]
fn merge_with_a_pinned_pipeline_denied_source_leaves_target_untouched() {
    let accessor = Accessor::init_in_memory().unwrap();
    let ctx = MutationContext::new(ActorType::Pipeline);
    let now = Utc::now();

    let source_id = uuid::Uuid::new_v4().to_string();
    let mut source = make_memory(&source_id, "source fact");
    source.pinned = true;
    accessor.with_write_tx(|conn| tx::ingest(conn, source, &ctx, now)).unwrap();

    let target_id = uuid::Uuid::new_v4().to_string();
    let target = make_memory(&target_id, "target fact");
    accessor.with_write_tx(|conn| tx::ingest(conn, target, &ctx, now)).unwrap();

    let decision = tx::ExtractedDecision::Merge {
        source_memory_id: source_id.clone(),
        target_memory_id: target_id.clone(),
        merged_content: "merged fact".to_string(),
    };
    let outcome = accessor.with_write_tx(|conn| tx::apply_decision(conn, decision, &ctx, now)).unwrap();
    assert_eq!(outcome, tx::ApplyDecisionOutcome::SkippedPinned);

    let target_after = accessor.with_read_db(|conn| memory_crud::get_memory(conn, &target_id)).unwrap().unwrap();
    assert_eq!(target_after.content, "target fact");
    assert_eq!(target_after.version, 1);

    let source_after = accessor.with_read_db(|conn| memory_crud::get_memory(conn, &source_id)).unwrap().unwrap();
    assert!(!source_after.is_deleted);

    assert_eq!(history_count(&accessor, &target_id), 1); // created only, no merge event
}
