//! HTTP server for the todo service.
//!
//! # Responsibility
//! - Load configuration, initialize logging, and own the `TodoStore`
//!   lifecycle for the process.
//! - Expose the `/api` router consumed by the browser front end.
//!
//! # Invariants
//! - The store is opened (migrated and seeded) before the listener binds.
//! - The store is closed exactly once, after the server stopped serving.

pub mod api;
pub mod config;
pub mod error;

use crate::config::{ConfigError, DatabaseLocation, ServerConfig};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use todo_core::{StoreError, TodoStore};
use tokio::net::TcpListener;

pub use api::router as app;

/// Fatal error raised before or while serving.
#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Logging(String),
    Store(StoreError),
    Io(std::io::Error),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Store(err) => write!(f, "todo store error: {err}"),
            Self::Io(err) => write!(f, "server I/O error: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(_) => None,
            Self::Store(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for StartupError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for StartupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Initializes process logging as configured.
pub fn init_logging(config: &ServerConfig) -> Result<(), StartupError> {
    let result = match config.log_dir.as_deref() {
        Some(dir) => todo_core::init_logging(&config.log_level, dir),
        None => todo_core::init_stderr_logging(&config.log_level),
    };
    result.map_err(StartupError::Logging)
}

/// Opens the configured store; resolves only once it is ready to serve.
pub async fn open_store(database: &DatabaseLocation) -> Result<TodoStore, StoreError> {
    match database {
        DatabaseLocation::Memory => TodoStore::open_in_memory().await,
        DatabaseLocation::File(path) => TodoStore::open(path.clone()).await,
    }
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    store: TodoStore,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app(store))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Runs the whole process lifecycle: open store → serve → close store.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    info!(
        "event=server_start module=server status=start run_mode={} version={}",
        config.run_mode.as_str(),
        todo_core::core_version()
    );

    let store = open_store(&config.database).await?;
    let addr = config.socket_addr();
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            store.close().await?;
            return Err(err.into());
        }
    };
    info!("event=server_listen module=server status=ok addr={addr}");

    let served = serve(listener, store.clone(), shutdown_signal()).await;
    let closed = store.close().await;
    finish_run(served, closed)?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

/// Folds the serve and close outcomes into one result.
///
/// A serve failure takes precedence; a close failure alongside it is logged.
fn finish_run(
    served: std::io::Result<()>,
    closed: Result<(), StoreError>,
) -> Result<(), StartupError> {
    match (served, closed) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(serve_err), Ok(())) => Err(serve_err.into()),
        (Ok(()), Err(close_err)) => Err(close_err.into()),
        (Err(serve_err), Err(close_err)) => {
            error!("event=store_close module=server status=error error={close_err}");
            Err(serve_err.into())
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
    info!("event=shutdown_signal module=server status=ok");
}

#[cfg(test)]
mod tests {
    use super::{finish_run, StartupError};
    use std::io::{Error as IoError, ErrorKind};
    use todo_core::StoreError;

    #[test]
    fn finish_run_keeps_serve_error_when_close_also_fails() {
        let result = finish_run(
            Err(IoError::new(ErrorKind::BrokenPipe, "accept loop died")),
            Err(StoreError::Closed),
        );
        match result {
            Err(StartupError::Io(err)) => assert_eq!(err.kind(), ErrorKind::BrokenPipe),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn finish_run_reports_close_error_after_clean_serve() {
        let result = finish_run(Ok(()), Err(StoreError::Closed));
        assert!(matches!(result, Err(StartupError::Store(StoreError::Closed))));
        assert!(finish_run(Ok(()), Ok(())).is_ok());
    }
}
