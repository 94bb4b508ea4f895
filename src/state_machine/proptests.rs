//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("test-conv")
}

/// Replay `events` from `Idle`, stopping at the first rejected event
fn replay(events: Vec<Event>) -> (ConvState, Vec<Effect>) {
    let context = test_context();
    let mut state = ConvState::Idle;
    let mut effects = Vec::new();
    for event in events {
        match transition(&state, &context, event) {
            Ok(result) => {
                state = result.new_state;
                effects.extend(result.effects);
            }
            Err(_) => break,
        }
    }
    (state, effects)
}

fn appended_ids(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::AppendMessage { message_id, .. } => Some(message_id.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,8}"
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,3}[a-zA-Z][a-zA-Z ]{0,20}"
}

fn arb_submit() -> impl Strategy<Value = Event> {
    (prop_oneof![arb_text(), arb_blank()], "[a-f0-9]{12}").prop_map(|(text, message_id)| {
        Event::UserSubmit { text, message_id }
    })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => arb_submit(),
        2 => "[a-f0-9]{12}".prop_map(|in_reply_to| Event::ReplyDue { in_reply_to }),
        1 => "[a-z]{0,20}".prop_map(|text| Event::DraftChanged { text }),
    ]
}

fn arb_pending_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        proptest::collection::vec("[a-f0-9]{12}", 1..5)
            .prop_map(|pending| ConvState::ReplyPending { pending }),
    ]
}

proptest! {
    // Invariant 1: Blank input never changes state or produces effects
    #[test]
    fn prop_blank_submit_is_noop(state in arb_pending_state(), text in arb_blank()) {
        let event = Event::UserSubmit { text, message_id: "m".to_string() };
        let result = transition(&state, &test_context(), event).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    // Invariant 2: Every accepted submit appends exactly one user message
    // and schedules exactly one reply for it
    #[test]
    fn prop_submit_schedules_exactly_one_reply(state in arb_pending_state(), text in arb_text()) {
        let event = Event::UserSubmit { text, message_id: "new-id".to_string() };
        let result = transition(&state, &test_context(), event).unwrap();

        let appends = appended_ids(&result.effects);
        prop_assert_eq!(appends, vec!["new-id".to_string()]);

        let scheduled: Vec<_> = result.effects.iter().filter(|e| matches!(
            e, Effect::ScheduleReply { in_reply_to, .. } if in_reply_to == "new-id"
        )).collect();
        prop_assert_eq!(scheduled.len(), 1);
        prop_assert_eq!(result.new_state.pending_replies(), state.pending_replies() + 1);
    }

    // Invariant 3: The append always precedes the schedule
    #[test]
    fn prop_append_before_schedule(text in arb_text()) {
        let event = Event::UserSubmit { text, message_id: "u".to_string() };
        let result = transition(&ConvState::Idle, &test_context(), event).unwrap();

        let append_pos = result.effects.iter().position(|e| matches!(e, Effect::AppendMessage { .. }));
        let schedule_pos = result.effects.iter().position(|e| matches!(e, Effect::ScheduleReply { .. }));
        prop_assert!(append_pos.unwrap() < schedule_pos.unwrap());
    }

    // Invariant 4: Appended message count never exceeds submissions, and
    // pending replies equal accepted submits minus delivered replies
    #[test]
    fn prop_pending_accounting(events in proptest::collection::vec(arb_event(), 0..40)) {
        let (state, effects) = replay(events);
        let users = appended_ids(&effects).len();
        let delivered = effects.iter().filter(|e| matches!(e, Effect::DeliverReply { .. })).count();
        prop_assert_eq!(state.pending_replies(), users - delivered);
    }

    // Invariant 5: Each user message gets at most one reply delivered
    #[test]
    fn prop_at_most_one_reply_per_message(
        texts in proptest::collection::vec(arb_text(), 1..6),
        extra_dues in 0usize..3,
    ) {
        let mut events = Vec::new();
        let ids: Vec<String> = (0..texts.len()).map(|i| format!("u{i}")).collect();
        for (text, id) in texts.iter().zip(&ids) {
            events.push(Event::UserSubmit { text: text.clone(), message_id: id.clone() });
        }
        // Fire every timer, some of them more than once
        for _ in 0..=extra_dues {
            for id in &ids {
                events.push(Event::ReplyDue { in_reply_to: id.clone() });
            }
        }

        let (state, effects) = replay(events);
        let delivered: Vec<&String> = effects.iter().filter_map(|e| match e {
            Effect::DeliverReply { in_reply_to } => Some(in_reply_to),
            _ => None,
        }).collect();

        let unique: HashSet<&String> = delivered.iter().copied().collect();
        prop_assert_eq!(unique.len(), delivered.len());
        prop_assert_eq!(delivered.len(), ids.len());
        prop_assert_eq!(state, ConvState::Idle);
    }

    // Invariant 6: Replies are delivered in the order their timers fire
    #[test]
    fn prop_replies_follow_timer_order(count in 1usize..6) {
        let ids: Vec<String> = (0..count).map(|i| format!("u{i}")).collect();
        let mut events: Vec<Event> = ids.iter()
            .map(|id| Event::UserSubmit { text: "a".to_string(), message_id: id.clone() })
            .collect();
        events.extend(ids.iter().map(|id| Event::ReplyDue { in_reply_to: id.clone() }));

        let (_, effects) = replay(events);
        let delivered: Vec<String> = effects.iter().filter_map(|e| match e {
            Effect::DeliverReply { in_reply_to } => Some(in_reply_to.clone()),
            _ => None,
        }).collect();
        prop_assert_eq!(delivered, ids);
    }

    // Invariant 7: Draft effects never exceed the input limit
    #[test]
    fn prop_draft_capped(text in "\\PC{0,700}", max in 1usize..600) {
        let context = test_context().with_max_input_chars(max);
        let result = transition(&ConvState::Idle, &context, Event::DraftChanged { text: text.clone() }).unwrap();
        match &result.effects[..] {
            [Effect::SetDraft { text: capped }] => {
                prop_assert!(capped.chars().count() <= max);
                prop_assert!(text.starts_with(capped.as_str()));
            }
            other => prop_assert!(false, "unexpected effects {:?}", other),
        }
    }

    // Invariant 8: Closed conversations reject everything
    #[test]
    fn prop_closed_rejects_all(event in arb_event()) {
        let result = transition(&ConvState::Closed, &test_context(), event);
        prop_assert!(matches!(result, Err(TransitionError::Closed)));
    }
}
