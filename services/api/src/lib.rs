mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use uw_workbench::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
