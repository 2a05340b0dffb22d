use crate::{
    config::app_config::{load_config, AppConfig},
    data::Data,
    model::create_schema,
    routes::{graphql_playground, health},
};
use async_graphql_poem::GraphQL;
use config::ConfigError;
use poem::{
    get,
    listener::TcpListener,
    middleware::{Cors, CorsEndpoint},
    EndpointExt, Route, Server,
};
use std::path::PathBuf;
use thiserror::Error;
use tokio::{
    io,
    io::Result as IoResult,
    signal,
    sync::{
        mpsc,
        mpsc::{Receiver, Sender},
    },
    task::JoinHandle,
};
use tracing::info;
use tracing_subscriber::{
    fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Failed to load schema: {0}")]
    SchemaError(String),
    #[error("Failed to join the server task: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl From<ServerError> for io::Error {
    fn from(error: ServerError) -> Self {
        io::Error::new(io::ErrorKind::Other, error)
    }
}

/// A GraphQL server whose mutations can share results within a request
pub struct GraphServer {
    data: Data,
    config: AppConfig,
}

impl GraphServer {
    pub fn new(
        data: Data,
        app_config: Option<AppConfig>,
        config_path: Option<PathBuf>,
    ) -> IoResult<Self> {
        let config = load_config(app_config, config_path).map_err(ServerError::ConfigError)?;
        Ok(Self { data, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start the server on the configured port and return a handle to it.
    pub async fn start(self) -> IoResult<RunningGraphServer> {
        let port = self.config.server.port;
        self.start_with_port(port).await
    }

    /// Start the server on the port `port` and return a handle to it.
    pub async fn start_with_port(self, port: u16) -> IoResult<RunningGraphServer> {
        let filter = self.config.logging.get_log_env();
        Registry::default()
            .with(filter)
            .with(fmt::layer().pretty().with_span_events(FmtSpan::NONE))
            .try_init()
            .ok();

        let address = self.config.server.bind_address(port);
        let app = self.generate_endpoint()?;

        let (signal_sender, signal_receiver) = mpsc::channel(1);

        info!("Playground live at: http://{address}");
        let server_task = Server::new(TcpListener::bind(address))
            .run_with_graceful_shutdown(app, server_termination(signal_receiver), None);
        let server_result = tokio::spawn(server_task);

        Ok(RunningGraphServer {
            signal_sender,
            server_result,
        })
    }

    fn generate_endpoint(self) -> Result<CorsEndpoint<Route>, ServerError> {
        let schema = create_schema(self.data).map_err(|e| ServerError::SchemaError(e.to_string()))?;
        let app = Route::new()
            .at("/", get(graphql_playground).post(GraphQL::new(schema)))
            .at("/health", get(health))
            .with(Cors::new());
        Ok(app)
    }

    /// Run the server on the configured port until completion.
    pub async fn run(self) -> IoResult<()> {
        self.start().await?.wait().await
    }

    /// Run the server on the port `port` until completion.
    pub async fn run_with_port(self, port: u16) -> IoResult<()> {
        self.start_with_port(port).await?.wait().await
    }
}

/// Handle to a started [`GraphServer`]
pub struct RunningGraphServer {
    signal_sender: Sender<()>,
    server_result: JoinHandle<IoResult<()>>,
}

impl RunningGraphServer {
    /// Stop the server.
    pub async fn stop(&self) {
        let _ignored = self.signal_sender.send(()).await;
    }

    /// Wait until server completion.
    pub async fn wait(self) -> IoResult<()> {
        self.server_result.await.map_err(ServerError::JoinError)?
    }
}

async fn server_termination(mut internal_signal: Receiver<()>) {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let internal_terminate = async {
        internal_signal.recv().await;
    };
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = internal_terminate => {},
    }
    info!("Shutting down server");
}
