use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // unix socket the host runtime connects to
    pub socket_path: PathBuf,
    // log level for http tracing
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        let socket_path = socket_path.into();
        tracing::info!(
            "Creating HTTP server Config: socket_path={}",
            socket_path.display()
        );
        Self {
            socket_path,
            log_level: tracing::Level::INFO,
        }
    }

    pub fn with_log_level(mut self, log_level: tracing::Level) -> Self {
        self.log_level = log_level;
        self
    }
}
