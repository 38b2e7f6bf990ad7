//! Pure dialogue state machine (§4.4 transition table).
//!
//! Kept free of I/O so the full transition table is unit-testable without
//! standing up providers or a media gateway.

use vc_domain::types::ConversationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueEvent {
    GreetingComplete,
    SttStartOfTurn { partial_nonempty: bool },
    SttEndOfTurn { text_nonempty: bool },
    LlmFirstToken,
    TtsComplete,
    HangUp,
}

/// Returns the next state for `(current, event)`, or `None` if the event
/// does not apply in the current state (caller should ignore it and stay
/// put).
pub fn next_state(current: ConversationState, event: DialogueEvent) -> Option<ConversationState> {
    use ConversationState::*;
    use DialogueEvent::*;

    match (current, event) {
        (_, HangUp) => Some(Ending),

        (Greeting, GreetingComplete) => Some(Listening),

        (Listening, SttStartOfTurn { .. }) => Some(Listening),
        (Listening, SttEndOfTurn { text_nonempty: true }) => Some(Processing),
        (Listening, SttEndOfTurn { text_nonempty: false }) => Some(Listening),

        (Processing, LlmFirstToken) => Some(Speaking),

        (Speaking, SttStartOfTurn { partial_nonempty: true }) => Some(BargeIn),
        (Speaking, TtsComplete) => Some(Listening),

        (BargeIn, SttEndOfTurn { text_nonempty: true }) => Some(Processing),
        (BargeIn, SttEndOfTurn { text_nonempty: false }) => Some(Listening),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConversationState::*;
    use DialogueEvent::*;

    #[test]
    fn greeting_completes_into_listening() {
        assert_eq!(next_state(Greeting, GreetingComplete), Some(Listening));
    }

    #[test]
    fn end_of_turn_with_empty_text_does_not_invoke_llm() {
        assert_eq!(next_state(Listening, SttEndOfTurn { text_nonempty: false }), Some(Listening));
    }

    #[test]
    fn end_of_turn_with_text_enters_processing() {
        assert_eq!(next_state(Listening, SttEndOfTurn { text_nonempty: true }), Some(Processing));
    }

    #[test]
    fn first_token_enters_speaking() {
        assert_eq!(next_state(Processing, LlmFirstToken), Some(Speaking));
    }

    #[test]
    fn nonempty_partial_while_speaking_triggers_barge_in() {
        assert_eq!(next_state(Speaking, SttStartOfTurn { partial_nonempty: true }), Some(BargeIn));
    }

    #[test]
    fn empty_partial_while_speaking_does_not_trigger_barge_in() {
        assert_eq!(next_state(Speaking, SttStartOfTurn { partial_nonempty: false }), None);
    }

    #[test]
    fn barge_in_after_zero_tts_chunks_still_returns_to_listening_cleanly() {
        // Barge-in happened before any TtsComplete; the subsequent EndOfTurn
        // with no text must still land cleanly back in Listening (§8).
        assert_eq!(next_state(BargeIn, SttEndOfTurn { text_nonempty: false }), Some(Listening));
    }

    #[test]
    fn tts_complete_returns_to_listening() {
        assert_eq!(next_state(Speaking, TtsComplete), Some(Listening));
    }

    #[test]
    fn hang_up_from_any_state_ends_the_call() {
        for state in [Greeting, Listening, Processing, Speaking, BargeIn] {
            assert_eq!(next_state(state, HangUp), Some(Ending));
        }
    }

    #[test]
    fn unexpected_event_in_state_is_ignored() {
        assert_eq!(next_state(Greeting, LlmFirstToken), None);
    }
}
