//! Prompt-builder session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the runtime feeds events in, applies the returned state, and executes
//! the returned effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Notice, NoticeLevel, UiEvent};
pub use event::Event;
pub use state::{ChatMode, ClientState, GenerationKind, Message, Role, SessionContext};
pub use transition::{transition, TransitionError};
