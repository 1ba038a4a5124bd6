/// Scheme prefix of a shared access signature header value.
pub const SAS_PREFIX: &str = "SharedAccessSignature";

pub const DEFAULT_TTL_SECS: i64 = 3600;
pub const DEFAULT_API_VERSION: &str = "2020-03-13";
pub const CLIENT_TIMEOUT_DEFAULT_MILLIS: u64 = 5000;

/// A cached token is reissued once less than `ttl / REFRESH_MARGIN_DIVISOR` seconds remain.
pub const REFRESH_MARGIN_DIVISOR: i64 = 10;

pub const DEFAULT_PERIOD_MILLIS: u64 = 100;
pub const READING_CHANNEL_CAPACITY: usize = 64;

pub const BODY_SNIPPET_MAX_CHARS: usize = 256;
pub const VIBRATION_CHANNEL: &str = "vibration";
