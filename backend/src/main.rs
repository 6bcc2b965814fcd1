use photo_share_backend::{server, state::AppState, types::Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env()?;
    environment.init_tracing();

    let state = AppState::from_environment(&environment).await?;

    server::start(state).await
}
