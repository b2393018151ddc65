//! Per-session conversation log.
//!
//! Turns are kept in arrival order. A turn starts `Pending` and is resolved
//! exactly once, either `Answered` or `Failed`; resolving it again leaves
//! the stored answer untouched. `clear` is the only way turns disappear.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::RagError;
use crate::rag::chunker::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Pending,
    Answered,
    Failed,
}

/// Opaque reference to a turn returned by [`ConversationMemory::append`].
///
/// Ids are never reused, so a handle taken before `clear` stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnHandle(u64);

impl TurnHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnHandle,
    pub question: String,
    pub answer: String,
    pub evidence: Vec<Segment>,
    pub status: TurnStatus,
    pub asked_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl Turn {
    pub fn is_pending(&self) -> bool {
        self.status == TurnStatus::Pending
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
    next_id: u64,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, question: impl Into<String>) -> TurnHandle {
        self.next_id += 1;
        let handle = TurnHandle(self.next_id);
        self.turns.push(Turn {
            id: handle,
            question: question.into(),
            answer: String::new(),
            evidence: Vec::new(),
            status: TurnStatus::Pending,
            asked_at: Utc::now(),
            answered_at: None,
        });
        handle
    }

    pub fn set_answer(
        &mut self,
        handle: TurnHandle,
        answer: impl Into<String>,
        evidence: Vec<Segment>,
    ) -> Result<&Turn, RagError> {
        self.resolve(handle, answer.into(), evidence, TurnStatus::Answered)
    }

    /// Resolves the turn with an error message as its answer. Terminal.
    pub fn set_failure(
        &mut self,
        handle: TurnHandle,
        message: impl Into<String>,
        evidence: Vec<Segment>,
    ) -> Result<&Turn, RagError> {
        self.resolve(handle, message.into(), evidence, TurnStatus::Failed)
    }

    fn resolve(
        &mut self,
        handle: TurnHandle,
        answer: String,
        evidence: Vec<Segment>,
        status: TurnStatus,
    ) -> Result<&Turn, RagError> {
        let turn = self
            .turns
            .iter_mut()
            .find(|t| t.id == handle)
            .ok_or(RagError::UnknownTurn(handle.0))?;

        if !turn.is_pending() {
            warn!(turn = handle.0, "Ignoring second answer for resolved turn");
            return Err(RagError::AlreadyAnswered(handle.0));
        }

        turn.answer = answer;
        turn.evidence = evidence;
        turn.status = status;
        turn.answered_at = Some(Utc::now());
        Ok(&*turn)
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, handle: TurnHandle) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == handle)
    }

    pub fn pending(&self) -> Option<&Turn> {
        self.turns.iter().find(|t| t.is_pending())
    }

    /// The last `limit` answered turns, oldest first. Pending and failed
    /// turns are skipped.
    pub fn recent_answered(&self, limit: usize) -> Vec<&Turn> {
        let answered: Vec<&Turn> = self
            .turns
            .iter()
            .filter(|t| t.status == TurnStatus::Answered)
            .collect();
        let skip = answered.len().saturating_sub(limit);
        answered.into_iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
