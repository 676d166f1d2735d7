//! Session metadata forwarded to the filter engine on connection changes.

/// Connection state of the host session.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Disconnected = 0,
    Connecting = 1,
    Reconnecting = 2,
    Connected = 3,
}

impl ConnectionState {
    /// Maps a host's raw state value. Values the engine does not know
    /// collapse to [`Disconnected`](Self::Disconnected).
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Reconnecting,
            3 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    /// The raw value the engine understands.
    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Host-side metadata of the current session.
///
/// Every field is optional: hosts fill in what they know at the time of the
/// connection event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Server-assigned session identifier.
    pub sid: Option<String>,
    /// Display name of the session.
    pub name: Option<String>,
    pub server_version: Option<String>,
    pub server_region: Option<String>,
    pub server_node_id: Option<String>,
    /// Connection URL.
    pub url: Option<String>,
    /// Access token used for the connection.
    pub token: Option<String>,
}

/// Out-of-band context handed to the filter engine.
///
/// Built fresh for every connection event and not retained by the adapter.
#[derive(derive_more::Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomContext {
    pub sid: Option<String>,
    pub name: Option<String>,
    pub server_version: Option<String>,
    pub server_region: Option<String>,
    pub server_node_id: Option<String>,
    pub connection_state: ConnectionState,
    pub url: Option<String>,
    #[debug(skip)]
    pub token: Option<String>,
}

impl RoomContext {
    /// Captures `session` together with the state it just moved to.
    pub fn from_session(session: &Session, connection_state: ConnectionState) -> Self {
        Self {
            sid: session.sid.clone(),
            name: session.name.clone(),
            server_version: session.server_version.clone(),
            server_region: session.server_region.clone(),
            server_node_id: session.server_node_id.clone(),
            connection_state,
            url: session.url.clone(),
            token: session.token.clone(),
        }
    }
}
