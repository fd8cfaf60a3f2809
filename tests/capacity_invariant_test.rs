//! Property tests for the capacity cache
//!
//! After any sequence of joins and leaves the cached count equals the live
//! participation count, never exceeds the maximum, and the event is full
//! exactly when no slot is left.

mod helpers;

use eventdesk::models::*;
use helpers::*;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Join(usize),
    Leave(usize),
}

fn op_strategy(attendees: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..attendees).prop_map(Op::Join),
        (0..attendees).prop_map(Op::Leave),
    ]
}

async fn run_sequence(max: i32, attendees: usize, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let ctx = TestContext::new();
    let organizer = ctx.organizer("olga").await;
    let event = ctx.approved_event(&organizer, "Property social", None, max).await;

    let mut dancers = Vec::new();
    for i in 0..attendees {
        dancers.push(ctx.attendee(&format!("dancer{}", i)).await);
    }

    let participation = &ctx.services.participation_service;
    for op in ops {
        match op {
            Op::Join(i) => {
                participation.join(&dancers[i], event.id).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            Op::Leave(i) => {
                participation.leave(&dancers[i], event.id).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
        }

        let live = ctx.participant_count(event.id).await;
        let capacity = ctx.capacity(event.id).await.expect("capacity exists");
        let status = ctx.event(event.id).await.expect("event exists").status;

        prop_assert_eq!(capacity.current_participants as i64, live);
        prop_assert!(capacity.current_participants <= capacity.max_participants);
        prop_assert_eq!(status == EventStatus::Full, capacity.current_participants == capacity.max_participants);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cached_count_tracks_participations(
        max in 1i32..4,
        ops in prop::collection::vec(op_strategy(5), 1..30),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(run_sequence(max, 5, ops))?;
    }
}
