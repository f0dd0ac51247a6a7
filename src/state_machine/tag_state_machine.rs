use super::{
    errors::{StateMachineError, StateMachineResult},
    events::TagEvent,
    states::TagState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagTransition {
    pub from: TagState,
    pub to: TagState,
    pub event: String,
    pub at: DateTime<Utc>,
}

/// In-memory state machine tracking a single tag through one request
#[derive(Debug, Clone)]
pub struct TagStateMachine {
    type_tag: String,
    state: TagState,
    history: Vec<TagTransition>,
}

impl TagStateMachine {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            state: TagState::Pending,
            history: Vec::new(),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn current_state(&self) -> TagState {
        self.state
    }

    pub fn history(&self) -> &[TagTransition] {
        &self.history
    }

    /// Apply `event`, returning the new state
    pub fn transition(&mut self, event: TagEvent) -> StateMachineResult<TagState> {
        let target = self.determine_target_state(self.state, &event)?;

        debug!(
            type_tag = %self.type_tag,
            from = %self.state,
            to = %target,
            event = event.event_type(),
            "Tag state transition"
        );

        self.history.push(TagTransition {
            from: self.state,
            to: target,
            event: event.event_type().to_string(),
            at: Utc::now(),
        });
        self.state = target;
        Ok(target)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        &self,
        current_state: TagState,
        event: &TagEvent,
    ) -> StateMachineResult<TagState> {
        if current_state.is_terminal() {
            return Err(StateMachineError::AlreadyTerminal {
                type_tag: self.type_tag.clone(),
                state: current_state,
            });
        }

        let target = match (current_state, event) {
            (TagState::Pending, TagEvent::CacheHit) => TagState::CacheHit,
            (TagState::Pending, TagEvent::Start) => TagState::Running,

            (TagState::Running, TagEvent::Succeed) => TagState::Succeeded,
            (TagState::Running, TagEvent::Recover(_)) => TagState::Recovered,

            // Fallback is reachable from every non-terminal state
            (_, TagEvent::Fallback(_)) => TagState::Fallback,

            (from, _) => {
                return Err(StateMachineError::InvalidTransition {
                    type_tag: self.type_tag.clone(),
                    from,
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}
