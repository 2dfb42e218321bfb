use crate::common::{Assignment, AssignmentDraft, ChatMessage, LocalIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    StudySessions,
    Assignments,
    Chat,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::StudySessions, Tab::Assignments, Tab::Chat];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::StudySessions => "Study Sessions",
            Tab::Assignments => "Assignments",
            Tab::Chat => "Group Chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected { sid: String },
    Disconnected { reason: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}

/// Form state for announcing a study session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySessionForm {
    pub topic: String,
    pub duration: u32,
}

impl Default for StudySessionForm {
    fn default() -> Self {
        Self {
            topic: "Cardiology Review".to_string(),
            duration: 60,
        }
    }
}

/// Figures shown on the dashboard, derived from the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub messages: usize,
    pub assignments: usize,
    pub completed: usize,
    pub sessions_started: u32,
    pub study_seconds: u64,
    pub dropped_sends: u32,
}

/// The whole client model. Mutated only through `AppState::update`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub identity: LocalIdentity,
    pub room_id: String,
    pub tab: Tab,
    pub connection: ConnectionStatus,
    pub messages: Vec<ChatMessage>,
    /// Chat compose field.
    pub compose: String,
    pub assignments: Vec<Assignment>,
    pub draft: AssignmentDraft,
    pub study_form: StudySessionForm,
    pub study_seconds: u64,
    pub sessions_started: u32,
    pub dropped_sends: u32,
    /// Last user-facing problem, cleared on the next successful action.
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(identity: LocalIdentity, room_id: impl Into<String>) -> Self {
        Self {
            identity,
            room_id: room_id.into(),
            tab: Tab::default(),
            connection: ConnectionStatus::Connecting,
            messages: Vec::new(),
            compose: String::new(),
            assignments: Vec::new(),
            draft: AssignmentDraft::default(),
            study_form: StudySessionForm::default(),
            study_seconds: 0,
            sessions_started: 0,
            dropped_sends: 0,
            notice: None,
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            messages: self.messages.len(),
            assignments: self.assignments.len(),
            completed: self.assignments.iter().filter(|a| a.completed).count(),
            sessions_started: self.sessions_started,
            study_seconds: self.study_seconds,
            dropped_sends: self.dropped_sends,
        }
    }
}

/// `HH:MM:SS`; hours keep counting past a day.
pub fn format_clock(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
