//! Tests for availability blocks: overlap merging on insert and display order.

use chrono::{NaiveTime, Weekday};
use lesson_engine::{
    plan_merge, sort_for_display, Schedule, ScheduleId, SchedulingError, SchedulingStore,
    TimeBlock, UserId,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn spans(store: &SchedulingStore, user: UserId, day: Weekday) -> Vec<(NaiveTime, NaiveTime)> {
    store
        .blocks_for(user)
        .into_iter()
        .filter(|s| s.weekday == day)
        .map(|s| (s.block.start(), s.block.end()))
        .collect()
}

const TUTOR: UserId = UserId(7);
const OTHER: UserId = UserId(8);

// ── Merging ─────────────────────────────────────────────────────────────────

#[test]
fn overlapping_block_is_combined() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Mon, t(10, 0), t(12, 0)).unwrap();

    let merged = store.add_block(TUTOR, Weekday::Mon, t(11, 0), t(13, 0)).unwrap();

    assert_eq!((merged.block.start(), merged.block.end()), (t(10, 0), t(13, 0)));
    assert_eq!(spans(&store, TUTOR, Weekday::Mon), vec![(t(10, 0), t(13, 0))]);
    assert_eq!(store.blocks_for(TUTOR).len(), 1);
}

#[test]
fn touching_blocks_are_combined() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Tue, t(9, 0), t(10, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Tue, t(10, 0), t(11, 0)).unwrap();

    assert_eq!(spans(&store, TUTOR, Weekday::Tue), vec![(t(9, 0), t(11, 0))]);
}

#[test]
fn wide_block_absorbs_several_blocks() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Wed, t(9, 0), t(10, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Wed, t(11, 0), t(12, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Wed, t(13, 0), t(14, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Wed, t(16, 0), t(17, 0)).unwrap();

    store.add_block(TUTOR, Weekday::Wed, t(9, 30), t(13, 30)).unwrap();

    assert_eq!(
        spans(&store, TUTOR, Weekday::Wed),
        vec![(t(9, 0), t(14, 0)), (t(16, 0), t(17, 0))]
    );
}

#[test]
fn contained_block_keeps_the_enclosing_range() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Fri, t(8, 0), t(18, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Fri, t(10, 0), t(11, 0)).unwrap();

    assert_eq!(spans(&store, TUTOR, Weekday::Fri), vec![(t(8, 0), t(18, 0))]);
}

#[test]
fn separate_blocks_stay_separate() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Mon, t(9, 0), t(10, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Mon, t(10, 1), t(11, 0)).unwrap();

    assert_eq!(store.blocks_for(TUTOR).len(), 2);
}

#[test]
fn other_weekday_is_untouched() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Mon, t(10, 0), t(12, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Tue, t(10, 0), t(12, 0)).unwrap();

    assert_eq!(spans(&store, TUTOR, Weekday::Mon), vec![(t(10, 0), t(12, 0))]);
    assert_eq!(spans(&store, TUTOR, Weekday::Tue), vec![(t(10, 0), t(12, 0))]);
    assert_eq!(store.blocks_for(TUTOR).len(), 2);
}

#[test]
fn other_user_is_untouched() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Mon, t(10, 0), t(12, 0)).unwrap();
    store.add_block(OTHER, Weekday::Mon, t(11, 0), t(13, 0)).unwrap();

    assert_eq!(spans(&store, TUTOR, Weekday::Mon), vec![(t(10, 0), t(12, 0))]);
    assert_eq!(spans(&store, OTHER, Weekday::Mon), vec![(t(11, 0), t(13, 0))]);
}

#[test]
fn zero_length_block_is_allowed() {
    let mut store = SchedulingStore::new();
    let block = store.add_block(TUTOR, Weekday::Sat, t(12, 0), t(12, 0)).unwrap();
    assert_eq!(block.block.start(), block.block.end());

    // It touches a block ending at noon, so the two merge.
    store.add_block(TUTOR, Weekday::Sat, t(11, 0), t(12, 0)).unwrap();
    assert_eq!(spans(&store, TUTOR, Weekday::Sat), vec![(t(11, 0), t(12, 0))]);
}

#[test]
fn reversed_range_is_rejected_and_store_unchanged() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Mon, t(10, 0), t(12, 0)).unwrap();

    let err = store
        .add_block(TUTOR, Weekday::Mon, t(13, 0), t(11, 0))
        .unwrap_err();

    assert!(matches!(err, SchedulingError::InvalidRange { .. }));
    assert_eq!(spans(&store, TUTOR, Weekday::Mon), vec![(t(10, 0), t(12, 0))]);
}

// ── Updating and removing ───────────────────────────────────────────────────

#[test]
fn updated_block_is_not_merged_with_itself() {
    let mut store = SchedulingStore::new();
    let original = store.add_block(TUTOR, Weekday::Mon, t(10, 0), t(13, 0)).unwrap();

    let updated = store
        .update_block(original.id, Weekday::Mon, t(10, 0), t(11, 0))
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(spans(&store, TUTOR, Weekday::Mon), vec![(t(10, 0), t(11, 0))]);
}

#[test]
fn updated_block_merges_with_its_new_neighbours() {
    let mut store = SchedulingStore::new();
    let moving = store.add_block(TUTOR, Weekday::Mon, t(8, 0), t(9, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Thu, t(14, 0), t(16, 0)).unwrap();

    store
        .update_block(moving.id, Weekday::Thu, t(15, 0), t(17, 0))
        .unwrap();

    assert!(spans(&store, TUTOR, Weekday::Mon).is_empty());
    assert_eq!(spans(&store, TUTOR, Weekday::Thu), vec![(t(14, 0), t(17, 0))]);
}

#[test]
fn updating_unknown_block_fails() {
    let mut store = SchedulingStore::new();
    let err = store
        .update_block(ScheduleId(99), Weekday::Mon, t(9, 0), t(10, 0))
        .unwrap_err();
    assert!(matches!(err, SchedulingError::NotFound(_)));
}

#[test]
fn removed_block_is_gone() {
    let mut store = SchedulingStore::new();
    let block = store.add_block(TUTOR, Weekday::Mon, t(9, 0), t(10, 0)).unwrap();
    store.remove_block(block.id).unwrap();

    assert!(store.blocks_for(TUTOR).is_empty());
    assert!(matches!(
        store.remove_block(block.id),
        Err(SchedulingError::NotFound(_))
    ));
}

// ── Pure planning ───────────────────────────────────────────────────────────

#[test]
fn plan_merge_reports_absorbed_ids() {
    let existing = vec![
        Schedule {
            id: ScheduleId(1),
            user: TUTOR,
            weekday: Weekday::Mon,
            block: TimeBlock::new(t(10, 0), t(12, 0)).unwrap(),
        },
        Schedule {
            id: ScheduleId(2),
            user: TUTOR,
            weekday: Weekday::Mon,
            block: TimeBlock::new(t(15, 0), t(16, 0)).unwrap(),
        },
        Schedule {
            id: ScheduleId(3),
            user: OTHER,
            weekday: Weekday::Mon,
            block: TimeBlock::new(t(11, 0), t(12, 0)).unwrap(),
        },
    ];

    let plan = plan_merge(
        &existing,
        TUTOR,
        Weekday::Mon,
        TimeBlock::new(t(11, 0), t(13, 0)).unwrap(),
        None,
    );

    assert_eq!(plan.absorbed, vec![ScheduleId(1)]);
    assert_eq!((plan.block.start(), plan.block.end()), (t(10, 0), t(13, 0)));
}

#[test]
fn time_block_rejects_reversed_range() {
    let err = TimeBlock::new(t(13, 0), t(12, 0)).unwrap_err();
    assert_eq!(err.to_string(), "Start time 13:00:00 cannot be after end time 12:00:00");
}

#[test]
fn reversed_block_fails_to_deserialize() {
    let json = r#"{"start": "13:00:00", "end": "12:00:00"}"#;
    assert!(serde_json::from_str::<TimeBlock>(json).is_err());
}

// ── Display order ───────────────────────────────────────────────────────────

#[test]
fn display_order_is_sunday_first_then_start_time() {
    let mut store = SchedulingStore::new();
    store.add_block(TUTOR, Weekday::Sat, t(9, 0), t(10, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Wed, t(9, 0), t(11, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Mon, t(14, 0), t(15, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Mon, t(9, 0), t(10, 0)).unwrap();
    store.add_block(TUTOR, Weekday::Sun, t(18, 0), t(19, 0)).unwrap();

    let order: Vec<(Weekday, NaiveTime)> = store
        .blocks_for(TUTOR)
        .iter()
        .map(|s| (s.weekday, s.block.start()))
        .collect();

    assert_eq!(
        order,
        vec![
            (Weekday::Sun, t(18, 0)),
            (Weekday::Mon, t(9, 0)),
            (Weekday::Mon, t(14, 0)),
            (Weekday::Wed, t(9, 0)),
            (Weekday::Sat, t(9, 0)),
        ]
    );
}

#[test]
fn sort_for_display_on_plain_slice() {
    let mut blocks = vec![
        Schedule {
            id: ScheduleId(1),
            user: TUTOR,
            weekday: Weekday::Wed,
            block: TimeBlock::new(t(9, 0), t(11, 0)).unwrap(),
        },
        Schedule {
            id: ScheduleId(2),
            user: TUTOR,
            weekday: Weekday::Mon,
            block: TimeBlock::new(t(10, 0), t(12, 0)).unwrap(),
        },
    ];
    sort_for_display(&mut blocks);
    assert_eq!(blocks[0].weekday, Weekday::Mon);
    assert_eq!(blocks[1].weekday, Weekday::Wed);
}
