// Per-tag lifecycle state machine
//
// Every requested type tag moves through
// PENDING -> (CACHE_HIT | RUNNING) -> (SUCCEEDED | RECOVERED | FALLBACK)
// exactly once. Terminal states never transition again.

pub mod errors;
pub mod events;
pub mod states;
pub mod tag_state_machine;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::TagEvent;
pub use states::TagState;
pub use tag_state_machine::{TagStateMachine, TagTransition};
