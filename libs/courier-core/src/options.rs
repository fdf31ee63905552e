use std::time::Duration;

/// Default connect timeout (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read/response timeout (60 seconds)
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-call transport options.
///
/// Supplied with every `execute` call and never mutated by the client, so
/// concurrent calls with different options cannot observe each other.
/// A zero timeout means the engine applies no limit for that phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    connect_timeout: Duration,
    read_timeout: Duration,
    follow_redirects: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            follow_redirects: true,
        }
    }
}

impl Options {
    #[must_use]
    pub fn new(connect_timeout: Duration, read_timeout: Duration, follow_redirects: bool) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            follow_redirects,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Time allowed to establish a connection
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Time allowed for the response to arrive
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    #[must_use]
    pub fn is_follow_redirects(&self) -> bool {
        self.follow_redirects
    }
}
