//! Development HTTP server with live reload for siteloop.
//!
//! This crate ties the loop together: it watches the project, rebuilds on
//! change, serves the build output and tells open browser tabs to reload.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use siteloop_server::{DevServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         project_dir: PathBuf::from("blog"),
//!         output_dir: PathBuf::from("blog/output"),
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = DevServer::bind(config).await.unwrap();
//!     println!("Serving on http://{}", server.local_addr().unwrap());
//!     server.run().await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! project dir ──notify──► WatchSession ──batch──► BuildTrigger ──► make html
//!                              ▲                      │
//!                              └──── pause/resume ────┤
//!                                                     ▼
//!                                               UpdateMarker
//!                                                     │ polled
//! Browser ──HTTP──► axum router                       ▼
//!                        ├─► /event_source ──► SSE `update` events
//!                        └─► /*  ──► output dir (reload script in HTML)
//! ```

mod app;
mod assets;
mod error;
mod live_reload;
mod middleware;
mod state;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use siteloop_build::{BuildCommand, BuildTrigger, UpdateMarker};
use siteloop_watch::{
    ChangeHandler, FailureReceiver, WatchError, WatchEvent, WatchOptions, WatchSession,
};
use tokio::net::TcpListener;

pub use error::ServerError;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Project root: watched recursively and used as the build's working
    /// directory.
    pub project_dir: PathBuf,
    /// Directory the build writes the site into.
    pub output_dir: PathBuf,
    /// Build program.
    pub build_program: String,
    /// Build program arguments.
    pub build_args: Vec<String>,
    /// Watcher settle interval and ignore patterns.
    pub watch: WatchOptions,
    /// How often live reload streams check for a new build.
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            project_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            build_program: "make".to_owned(),
            build_args: vec!["html".to_owned()],
            watch: WatchOptions::default(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ServerConfig {
    /// Build command described by this configuration.
    #[must_use]
    pub fn build_command(&self) -> BuildCommand {
        BuildCommand::new(
            self.build_program.clone(),
            self.build_args.clone(),
            self.project_dir.clone(),
        )
    }
}

/// Create server configuration from siteloop config.
#[must_use]
pub fn server_config_from_config(config: &siteloop_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        project_dir: config.project_resolved.root.clone(),
        output_dir: config.project_resolved.output_dir.clone(),
        build_program: config.build.command.clone(),
        build_args: config.build.args.clone(),
        watch: WatchOptions {
            settle: config.watch.settle_interval(),
            ignore: config.watch.ignore.clone(),
            metadata: config.watch.metadata,
        },
        poll_interval: config.live_reload.poll_interval(),
    }
}

/// A bound development server with its watcher running.
pub struct DevServer {
    listener: TcpListener,
    app: Router,
    session: WatchSession,
    failures: FailureReceiver,
}

impl DevServer {
    /// Start watching the project and bind the listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Watch`] if the project cannot be watched and
    /// [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let marker = Arc::new(UpdateMarker::new());

        let mut session = WatchSession::new(&config.project_dir, config.watch.clone())?;
        let trigger = Arc::new(BuildTrigger::new(
            config.build_command(),
            session.control(),
            Arc::clone(&marker),
        ));
        tracing::info!(
            root = %session.root().display(),
            command = %trigger.command().display(),
            "Rebuilding on change"
        );
        let failures = session.start(move |events: &[WatchEvent]| trigger.on_change(events))?;

        let address = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| ServerError::Bind { address, source })?;

        let state = Arc::new(AppState {
            output_dir: config.output_dir,
            marker,
            poll_interval: config.poll_interval,
        });

        Ok(Self {
            listener,
            app: app::create_router(state),
            session,
            failures,
        })
    }

    /// Address the server is listening on.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until Ctrl-C or a watcher failure.
    ///
    /// Open connections are dropped on shutdown rather than drained, since
    /// live reload streams never finish on their own.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Watch`] if the watcher fails while serving.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self {
            listener,
            app,
            mut session,
            failures,
        } = self;

        let shutdown = async {
            let signal = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, stopping server...");
            signal
        };
        serve_until(listener, app, &mut session, failures, shutdown).await
    }
}

/// Serve until `shutdown` resolves, the watcher fails or the server errors,
/// then stop the watch session.
async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    session: &mut WatchSession,
    failures: FailureReceiver,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Starting server");
    }

    let result = tokio::select! {
        served = axum::serve(listener, app).into_future() => served.map_err(ServerError::from),
        signal = shutdown => signal.map_err(ServerError::from),
        failure = watcher_failure(failures) => {
            tracing::error!(error = %failure, "Watcher failed, stopping server");
            Err(ServerError::Watch(failure))
        }
    };

    session.stop();
    result
}

/// Resolve with the watcher's first failure, or never if it stops cleanly.
async fn watcher_failure(failures: FailureReceiver) -> WatchError {
    match failures.await {
        Ok(error) => error,
        Err(_) => std::future::pending().await,
    }
}
