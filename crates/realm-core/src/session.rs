//! A connected user: their connection, character and story progress.

use realm_progress::Progress;
use realm_types::{NetworkId, ProgressEventKind, ServerMessage, SessionId};

use crate::connection::Connection;

/// Per-user session state, owned by the world.
#[derive(Debug)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Display name, also the character's name.
    pub username: String,
    /// Name of the area the character is in.
    pub area: String,
    /// The character this session controls.
    pub character: NetworkId,
    /// The entity whose dialog is open, if any.
    pub open_dialog: Option<NetworkId>,
    connection: Box<dyn Connection>,
    progress: Progress,
}

impl Session {
    /// Create a session for a freshly spawned character.
    pub fn new(
        id: SessionId,
        username: impl Into<String>,
        connection: Box<dyn Connection>,
        area: impl Into<String>,
        character: NetworkId,
        progress: Progress,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            area: area.into(),
            character,
            open_dialog: None,
            connection,
            progress,
        }
    }

    /// Send a message to this session's client.
    pub fn send(&self, message: ServerMessage) {
        self.connection.send(message);
    }

    /// Close the client connection.
    pub fn close(&self) {
        self.connection.close();
    }

    /// Route a world event into this session's progress and deliver
    /// whatever it produces. Returns how many messages were sent.
    pub fn emit(&mut self, kind: ProgressEventKind, value: &str) -> usize {
        let messages = self.progress.handle_event(kind, value);
        let count = messages.len();
        for message in messages {
            self.connection.send(message);
        }
        count
    }

    /// The session's story progress.
    pub const fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Release every progress subscription. Safe to call more than once.
    pub fn dispose(&mut self) -> usize {
        self.progress.dispose()
    }
}
