// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8908;
pub const WS_PATH: &str = "ws";

// Room allocation
pub const ROOM_CAPACITY: usize = 3;
pub const DEFAULT_SHUFFLE_SECS: u64 = 180;
pub const ROOM_ID_PATTERN: &str = "xxxxxxxxyxxxyxxx";
pub const MAX_ROOM_ID_ATTEMPTS: usize = 16;

// Account validation
pub const NICKNAME_MIN_LENGTH: usize = 2;
pub const NICKNAME_MAX_LENGTH: usize = 24;
pub const DEFAULT_AVATAR_SIZE: u32 = 48;
pub const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

// Inbound frames
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2048;
pub const MIN_MESSAGE_LENGTH: usize = 2;
