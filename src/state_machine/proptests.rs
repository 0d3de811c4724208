//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::*;
use crate::api::{ApiError, ChatReply, UploadedReference};
use crate::reference::{Document, DOCX_MIME};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("test-session")
}

fn apply(state: &ClientState, event: Event) -> ClientState {
    match transition(state, &test_context(), event) {
        Ok(result) => result.new_state,
        Err(_) => state.clone(),
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_mode() -> impl Strategy<Value = ChatMode> {
    prop_oneof![
        Just(ChatMode::Image),
        Just(ChatMode::Elearning),
        Just(ChatMode::Outline),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    ("[a-zA-Z][a-zA-Z ]{0,29}", any::<bool>(), any::<bool>()).prop_map(|(content, assistant, flag)| {
        if assistant {
            Message {
                is_final_prompt: flag,
                ..Message::assistant(content)
            }
        } else {
            Message::user(content)
        }
    })
}

/// An idle state of `mode` whose session has accumulated arbitrary content
fn arb_used_state() -> impl Strategy<Value = ClientState> {
    (
        arb_mode(),
        0u64..5,
        proptest::collection::vec(arb_message(), 0..8),
        "[a-z ]{0,20}",
        "[a-z ]{0,20}",
        any::<bool>(),
    )
        .prop_map(|(mode, epoch, extra, reference, generated, panel)| {
            let mut state = ClientState::new(mode);
            state.epoch = epoch;
            state.session.messages.extend(extra);
            if !reference.is_empty() {
                state.session.reference_status = format!("loaded {reference}");
            }
            state.session.reference_content = reference;
            state.session.generated_content.clone_from(&generated);
            state.session.generated_image_url = generated;
            state.reference_panel_open = panel;
            state
        })
}

fn arb_api_error() -> impl Strategy<Value = ApiError> {
    prop_oneof![
        Just(ApiError::network("down")),
        Just(ApiError::server("HTTP 500")),
        Just(ApiError::auth("HTTP 401")),
        "[a-z ]{1,10}".prop_map(ApiError::rejected),
    ]
}

fn arb_document() -> impl Strategy<Value = Document> {
    prop_oneof![Just(DOCX_MIME.to_string()), Just("application/pdf".to_string())].prop_map(
        |mime_type| Document {
            file_name: "doc".into(),
            mime_type,
            bytes: vec![0],
        },
    )
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_mode().prop_map(|mode| Event::ModeSelected { mode }),
        Just(Event::ClearRequested),
        "[a-z ]{0,12}".prop_map(|text| Event::UserMessage { text }),
        proptest::option::of(0usize..10)
            .prop_map(|message_index| Event::GenerateRequested { message_index }),
        Just(Event::ReferencePanelOpened),
        Just(Event::ReferencePanelClosed),
        "[a-z ]{0,12}".prop_map(|text| Event::ReferenceTextSubmitted { text }),
        arb_document().prop_map(|document| Event::DocumentSelected { document }),
        (0u64..4, "[a-z ]{1,12}", any::<bool>(), any::<bool>()).prop_map(
            |(epoch, response, is_final_prompt, ok)| Event::ChatReplied {
                epoch,
                result: if ok {
                    Ok(ChatReply {
                        response,
                        is_final_prompt,
                    })
                } else {
                    Err(ApiError::server("HTTP 502"))
                },
            }
        ),
        (0u64..4, proptest::result::maybe_ok("[a-z]{1,8}", arb_api_error())).prop_map(
            |(epoch, result)| Event::ImageGenerated { epoch, result }
        ),
        (
            0u64..4,
            prop_oneof![Just(GenerationKind::Storyboard), Just(GenerationKind::Outline)],
            proptest::result::maybe_ok("[a-z]{1,8}", arb_api_error())
        )
            .prop_map(|(epoch, kind, result)| Event::ContentGenerated {
                epoch,
                kind,
                result
            }),
        (0u64..4, any::<bool>()).prop_map(|(epoch, ok)| Event::DocumentUploaded {
            epoch,
            result: if ok {
                Ok(UploadedReference {
                    content: "extracted".into(),
                    status: "processed".into(),
                })
            } else {
                Err(ApiError::server("HTTP 500"))
            },
        }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // A reset always yields exactly the seeded session of the target mode
    #[test]
    fn prop_reset_seeds_target_mode(state in arb_used_state(), target in arb_mode(), clear in any::<bool>()) {
        prop_assume!(clear || target != state.mode());
        let event = if clear { Event::ClearRequested } else { Event::ModeSelected { mode: target } };
        let expected_mode = if clear { state.mode() } else { target };

        let result = transition(&state, &test_context(), event).unwrap();
        let next = result.new_state;

        prop_assert_eq!(&next.session, &Session::new(expected_mode));
        prop_assert_eq!(next.epoch, state.epoch + 1);
        prop_assert!(!next.reference_panel_open);
        let want = Effect::ClearRemote { mode: expected_mode };
        prop_assert!(result.effects.contains(&want));
    }

    // Selecting the current mode changes nothing
    #[test]
    fn prop_same_mode_is_noop(state in arb_used_state()) {
        let result = transition(&state, &test_context(), Event::ModeSelected { mode: state.mode() }).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    // Whitespace-only input never appends or requests
    #[test]
    fn prop_blank_message_rejected(state in arb_used_state(), text in "[ \t\n]{0,10}") {
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyMessage);
    }

    // Every completed send adds exactly the user message then one assistant message
    #[test]
    fn prop_send_appends_pairs_in_order(
        mode in arb_mode(),
        turns in proptest::collection::vec(("[a-z]{1,10}", "[a-z]{1,10}", any::<bool>()), 1..6),
    ) {
        let mut state = ClientState::new(mode);
        for (text, reply, ok) in turns {
            let before = state.messages().len();
            state = transition(&state, &test_context(), Event::UserMessage { text: format!("  {text} ") })
                .unwrap()
                .new_state;
            let result = if ok {
                Ok(ChatReply { response: reply.clone(), is_final_prompt: false })
            } else {
                Err(ApiError::network("down"))
            };
            state = apply(&state, Event::ChatReplied { epoch: state.epoch, result });

            let messages = state.messages();
            prop_assert_eq!(messages.len(), before + 2);
            prop_assert_eq!(&messages[before], &Message::user(text));
            prop_assert_eq!(messages[before + 1].role, Role::Assistant);
            let expected = if ok { reply.as_str() } else { APOLOGY_MESSAGE };
            prop_assert_eq!(messages[before + 1].content.as_str(), expected);
            prop_assert!(!state.chat.is_busy());
        }
    }

    // Generation always uses the most recent qualifying message and logs
    // exactly one action line
    #[test]
    fn prop_generate_uses_latest_final_prompt(
        mode in arb_mode(),
        extra in proptest::collection::vec(arb_message(), 0..10),
    ) {
        let mut state = ClientState::new(mode);
        state.session.messages.extend(extra);
        let expected = state
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && m.is_final_prompt)
            .map(|m| m.content.clone());

        let result = transition(&state, &test_context(), Event::GenerateRequested { message_index: None });
        match expected {
            None => prop_assert_eq!(result.unwrap_err(), TransitionError::NoFinalPrompt),
            Some(prompt) => {
                let result = result.unwrap();
                let before = state.messages().len();
                let action = Message::user(mode.generation_kind().action_text());
                prop_assert_eq!(result.new_state.messages().len(), before + 1);
                prop_assert_eq!(&result.new_state.messages()[before], &action);
                let effects = result.effects;
                let sent = effects.iter().find_map(|e| match e {
                    Effect::RequestImage { prompt, .. } => Some(prompt.clone()),
                    Effect::RequestContent { request, .. } => Some(request.prompt.clone()),
                    _ => None,
                });
                prop_assert_eq!(sent, Some(prompt));
            }
        }
    }

    // No request is issued while a request of the same kind is in flight,
    // and the seeded prefix always matches the current mode
    #[test]
    fn prop_busy_flags_exclude_duplicate_requests(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ClientState::new(ChatMode::Image);
        let ctx = test_context();

        for event in events {
            let Ok(result) = transition(&state, &ctx, event) else {
                continue;
            };
            for effect in &result.effects {
                match effect {
                    Effect::RequestChat { .. } => prop_assert!(!state.chat.is_busy()),
                    Effect::RequestImage { .. } => prop_assert!(!state.image.is_busy()),
                    Effect::RequestContent { .. } => prop_assert!(!state.content.is_busy()),
                    Effect::UploadDocument { document, .. } => {
                        prop_assert!(!state.upload.is_busy());
                        prop_assert_eq!(document.mime_type.as_str(), DOCX_MIME);
                    }
                    _ => {}
                }
            }
            state = result.new_state;

            let seed = Session::new(state.mode()).messages;
            prop_assert!(state.messages().len() >= 2);
            prop_assert_eq!(&state.messages()[..2], &seed[..]);
            prop_assert_eq!(state.session.mode, state.mode());
        }
    }

    // A result issued before a reset never touches the new session
    #[test]
    fn prop_stale_results_leave_session_untouched(
        state in arb_used_state(),
        target in arb_mode(),
        response in "[a-z]{1,10}",
        ok in any::<bool>(),
    ) {
        let old_epoch = state.epoch;
        let mut busy = state.clone();
        busy.chat = Flight::pending(old_epoch);
        busy.image = Flight::pending_for(old_epoch, 3);
        busy.upload = Flight::pending(old_epoch);

        let reset = transition(&busy, &test_context(), Event::ClearRequested).unwrap().new_state;
        let reset = apply(&reset, Event::ModeSelected { mode: target });
        let session = reset.session.clone();

        let stale = [
            Event::ChatReplied {
                epoch: old_epoch,
                result: if ok { Ok(ChatReply { response: response.clone(), is_final_prompt: true }) } else { Err(ApiError::auth("expired")) },
            },
            Event::ImageGenerated { epoch: old_epoch, result: Ok(response.clone()) },
            Event::DocumentUploaded {
                epoch: old_epoch,
                result: Ok(UploadedReference { content: response.clone(), status: "ok".into() }),
            },
        ];

        let mut current = reset;
        for event in stale {
            let result = transition(&current, &test_context(), event).unwrap();
            prop_assert!(result.effects.is_empty());
            current = result.new_state;
            prop_assert_eq!(&current.session, &session);
        }
        prop_assert!(current.is_quiescent());
    }
}
