use crate::{
    config::{
        app_config::AppConfigBuilder,
        log_config::DEFAULT_LOG_LEVEL,
        server_config::{DEFAULT_HOST, DEFAULT_PORT},
    },
    data::Data,
    model::create_schema,
    server::{GraphServer, ServerError},
};
use clap::{command, Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::Result as IoResult;

#[derive(Parser)]
#[command(about = "Run the GraphServer with specified configurations")]
struct Args {
    #[arg(long, env = "SHARED_RESULTS_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "SHARED_RESULTS_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "SHARED_RESULTS_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    #[arg(long, env = "SHARED_RESULTS_CONFIG_PATH", default_value = None)]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print the GraphQL schema to the standard output")]
    Schema,
}

pub async fn cli() -> IoResult<()> {
    let args = Args::parse();

    if let Some(Commands::Schema) = args.command {
        let schema =
            create_schema(Data::new()).map_err(|e| ServerError::SchemaError(e.to_string()))?;
        println!("{}", schema.sdl());
    } else {
        // a config file only applies when no explicit configuration is given
        let app_config = args.config_path.is_none().then(|| {
            AppConfigBuilder::new()
                .with_host(args.host)
                .with_port(args.port)
                .with_log_level(args.log_level)
                .build()
        });

        GraphServer::new(Data::new(), app_config, args.config_path)?
            .run()
            .await?;
    }
    Ok(())
}
