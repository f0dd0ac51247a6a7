use super::states::TagState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("Invalid transition for {type_tag} from {from} on {event}")]
    InvalidTransition {
        type_tag: String,
        from: TagState,
        event: String,
    },
    #[error("Tag {type_tag} already reached terminal state {state}")]
    AlreadyTerminal { type_tag: String, state: TagState },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
