//! Explicit edit-session value for form adapters.
//!
//! A form adapter holds one `EditSession` per form. Saving with
//! `Editing { kind, id }` updates that record; any other session creates a
//! new record. Sessions for one entity kind never affect another kind.

/// Entity kinds addressable by an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Member,
    Goal,
    Activity,
    Publication,
    PrivateGoal,
    WorkLogEntry,
    Todo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Creating,
    Editing {
        kind: EntityKind,
        id: String,
    },
}

impl EditSession {
    pub fn editing(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::Editing {
            kind,
            id: id.into(),
        }
    }

    /// Id being edited, if this session edits a record of `kind`.
    pub fn target(&self, kind: EntityKind) -> Option<&str> {
        match self {
            Self::Editing {
                kind: editing,
                id,
            } if *editing == kind => Some(id.as_str()),
            _ => None,
        }
    }
}
