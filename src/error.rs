use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum TriadError {
    // Session errors
    SessionNotFound(String),
    DuplicateSession(String),

    // Account errors
    NicknameTaken(String),

    // Messages errors
    MessageParseError(String),
    MessageTooLarge(usize),

    // Room errors
    NoCapacity,

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for TriadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Self::DuplicateSession(id) => write!(f, "Session already registered: {}", id),
            Self::NicknameTaken(nick) => write!(f, "Nickname already taken: {}", nick),
            Self::MessageParseError(msg) => write!(f, "Message parse error: {}", msg),
            Self::MessageTooLarge(size) => write!(f, "Message too large: {} bytes", size),
            Self::NoCapacity => write!(f, "Unable to generate a fresh room identifier"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for TriadError {}

impl TriadError {
    /// Text shown to the client when a frame is rejected
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::MessageTooLarge(_) => "Message too large",
            _ => "Incorrect message format",
        }
    }
}

// Generic result type for the chat server
pub type Result<T> = std::result::Result<T, TriadError>;
