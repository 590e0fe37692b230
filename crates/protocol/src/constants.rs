use std::time::Duration;

/// Product name, used for self-log file names.
pub const APP_NAME: &str = "logyard";

/// Default port for the web UI.
pub const DEFAULT_PORT: u16 = 23212;

/// Default interval between size checks of a tailed file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Internal buffer size of a tail session's file reader.
pub const READ_BUFFER_SIZE: usize = 2048;

/// Default rolling chunk size, in megabytes.
pub const DEFAULT_CHUNK_MB: u64 = 10;

/// Prefix that expands to the logyard home directory in user paths.
pub const HOME_DIR_MARKER: &str = "app://";

/// Default capture directory (also the default source list).
pub const DEFAULT_CAPTURE_DIR: &str = "app://captures/";

/// Suffix a file must carry to be listed as a log source.
pub const LOG_SUFFIX: &str = ".log";

/// Upper bound for the graceful shutdown sequence.
///
/// If the server has not drained within this window the process exits
/// abruptly instead of hanging.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Route of the catalog listing page.
pub const LISTING_ROUTE: &str = "/";

/// Route that triggers process shutdown.
pub const SHUTDOWN_ROUTE: &str = "/$";

/// Prefix of every per-source route.
pub const SOURCE_ROUTE_PREFIX: &str = "/src/";

/// Suffix appended to a viewer route to reach its stream endpoint.
pub const STREAM_ROUTE_SUFFIX: &str = "/$";

/// Placeholder replaced with the source listing in the index template.
pub const SOURCES_PLACEHOLDER: &str = "<!--SOURCES-->";

/// Placeholder replaced with the source path in the viewer template.
pub const PATH_PLACEHOLDER: &str = "<!--PATH-->";
