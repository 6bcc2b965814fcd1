//! Thumbnail function: renders `thumb-` images for new uploads

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use photo_share_backend::{state::AppState, thumbnails, types::Environment};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let environment = Environment::from_lambda_env()?;
    environment.init_tracing();

    let state = AppState::from_environment(&environment).await?;
    let state = &state;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(thumbnails::handle(state, event.payload).await)
    }))
    .await
}
