mod cli;
mod infra;
mod routes;
mod server;
mod submit;

use signup_forms::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
