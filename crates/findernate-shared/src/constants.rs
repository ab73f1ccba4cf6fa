/// Application name
pub const APP_NAME: &str = "FinderNate";

/// Pending optimistic messages older than this are swept (2 minutes)
pub const PENDING_MESSAGE_TTL_SECS: u64 = 120;

/// How often the owner sweeps the pending-message queue
pub const QUEUE_SWEEP_INTERVAL_SECS: u64 = 30;

/// Fallback polling interval for unread / request counters (5 minutes)
pub const COUNTS_REFRESH_INTERVAL_SECS: u64 = 300;

/// Default REST backend base URL (development)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api/v1";

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Poll interval of the cross-process event transport in milliseconds
pub const SIGNAL_POLL_INTERVAL_MS: u64 = 1000;

/// Number of cross-process signals retained after pruning
pub const SIGNAL_RETENTION: i64 = 256;

/// Event names (wire-stable, shared with the web front-end)
pub const EVENT_REFRESH_MESSAGE_COUNTS: &str = "refresh-message-counts";
pub const EVENT_SEND_TIMED_OUT: &str = "send-timed-out";
pub const EVENT_UNREAD_CHANGED: &str = "unread-changed";

/// Display fallbacks
pub const DEFAULT_GROUP_NAME: &str = "Group Chat";
pub const UNKNOWN_USER_NAME: &str = "Unknown User";
pub const DEFAULT_AVATAR_URL: &str = "/placeholderimg.png";

/// Local store keys
pub const STORE_KEY_USER: &str = "user";
pub const STORE_KEY_TOKEN: &str = "token";
