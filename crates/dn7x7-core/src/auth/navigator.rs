use tracing::info;

/// Path frontends should send the user to once the session is gone
pub const LOGIN_PATH: &str = "/login";

/// Receives navigation requests from the client.
///
/// The client calls `navigate(LOGIN_PATH)` after it has cleared the stored
/// credentials because no refresh was possible.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, path: &str) {
        self(path)
    }
}

/// Default navigator for headless use: records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        info!(path = path, "Session ended, navigation requested");
    }
}
