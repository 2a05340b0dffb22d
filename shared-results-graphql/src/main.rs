use shared_results_graphql::cli::cli;
use tokio::io::Result as IoResult;

#[tokio::main]
async fn main() -> IoResult<()> {
    cli().await
}
