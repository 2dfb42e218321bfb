use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::common::types::DUE_DATE_FORMAT;
use crate::common::{
    Assignment, AssignmentDraft, ChannelEvent, ChatMessage, InboundEvent, OutboundEvent,
    RoomMessage, StudySessionRequest, ValidationError,
};

use super::model::{AppState, ConnectionStatus, Tab};

/// Everything that can change the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectTab(Tab),
    SendMessage,
    AddAssignment,
    ClearDraft,
    ToggleAssignment(usize),
    StartStudySession,
    /// One second of wall-clock time passed.
    Tick,
    Channel(ChannelEvent),
}

impl AppState {
    /// Applies one action. Returns the event to put on the channel, if any.
    ///
    /// A rejected action leaves the model untouched.
    pub fn update(
        &mut self,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Option<OutboundEvent>, ValidationError> {
        let outbound = match action {
            Action::SelectTab(tab) => {
                self.tab = tab;
                None
            }
            Action::SendMessage => Some(self.send_message(now)?),
            Action::AddAssignment => Some(self.add_assignment(now)?),
            Action::ClearDraft => {
                self.draft = AssignmentDraft::default();
                None
            }
            Action::ToggleAssignment(index) => {
                self.toggle_assignment(index);
                None
            }
            Action::StartStudySession => {
                let form = self.study_form.clone();
                Some(self.start_study_session(&form.topic, form.duration)?)
            }
            Action::Tick => {
                self.study_seconds += 1;
                None
            }
            Action::Channel(event) => {
                self.apply(event);
                None
            }
        };
        Ok(outbound)
    }

    /// Sends the compose field as a chat message.
    pub fn send_message(&mut self, now: DateTime<Utc>) -> Result<OutboundEvent, ValidationError> {
        if self.compose.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        let message = ChatMessage {
            text: std::mem::take(&mut self.compose),
            user: self.identity.display_name.clone(),
            timestamp: display_time(now),
            avatar_color: self.identity.avatar_color.clone(),
        };
        self.messages.push(message.clone());
        self.notice = None;

        Ok(OutboundEvent::SendMessage(RoomMessage {
            message,
            room_id: self.room_id.clone(),
        }))
    }

    /// Commits the assignment draft.
    pub fn add_assignment(&mut self, now: DateTime<Utc>) -> Result<OutboundEvent, ValidationError> {
        let assignment = build_assignment(
            &self.draft,
            &self.identity.display_name,
            &self.identity.avatar_color,
            now,
        )?;

        self.assignments.push(assignment.clone());
        self.draft = AssignmentDraft::default();
        self.notice = None;
        Ok(OutboundEvent::AddAssignment(assignment))
    }

    /// Announces a study session hosted by the local identity.
    pub fn start_study_session(
        &mut self,
        topic: &str,
        duration: u32,
    ) -> Result<OutboundEvent, ValidationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if duration == 0 {
            return Err(ValidationError::ZeroDuration);
        }

        self.sessions_started += 1;
        self.notice = None;
        Ok(OutboundEvent::StartStudySession(StudySessionRequest {
            host: self.identity.display_name.clone(),
            topic: topic.to_string(),
            duration,
        }))
    }

    /// Flips `completed` on the assignment at `index`. Local only.
    pub fn toggle_assignment(&mut self, index: usize) -> bool {
        match self.assignments.get_mut(index) {
            Some(assignment) => {
                assignment.completed = !assignment.completed;
                true
            }
            None => false,
        }
    }

    /// Folds an event from the connection manager into the mirror.
    pub fn apply(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected { sid } => {
                self.connection = ConnectionStatus::Connected { sid };
                self.notice = None;
            }
            ChannelEvent::Disconnected { reason } => {
                self.connection = ConnectionStatus::Disconnected { reason };
            }
            ChannelEvent::Inbound(InboundEvent::NewMessage(message)) => {
                self.messages.push(message);
            }
            ChannelEvent::Inbound(InboundEvent::AssignmentAdded(assignment)) => {
                self.assignments.push(assignment);
            }
            ChannelEvent::SendDropped { event } => {
                self.dropped_sends += 1;
                self.notice = Some(format!("`{event}` was not delivered: offline"));
            }
        }
    }
}

fn build_assignment(
    draft: &AssignmentDraft,
    submitted_by: &str,
    color: &str,
    now: DateTime<Utc>,
) -> Result<Assignment, ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let due = draft.due_date.trim();
    let due_date = if due.is_empty() {
        None
    } else {
        Some(NaiveDate::parse_from_str(due, DUE_DATE_FORMAT).map_err(|_| {
            ValidationError::InvalidDueDate {
                value: due.to_string(),
            }
        })?)
    };

    Ok(Assignment {
        id: now.timestamp_millis(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        due_date,
        created_at: now,
        completed: false,
        submitted_by: submitted_by.to_string(),
        color: color.to_string(),
    })
}

/// Wall-clock time the way a browser's `toLocaleTimeString` shows it.
fn display_time(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%-I:%M:%S %p").to_string()
}
