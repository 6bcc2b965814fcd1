//! Gallery reader function: lists thumbnails and serves single images

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use photo_share_backend::{gallery, state::AppState, types::Environment};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let environment = Environment::from_lambda_env()?;
    environment.init_tracing();

    let state = AppState::from_environment(&environment).await?;
    let state = &state;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(gallery::handle_event(state, event.payload).await)
    }))
    .await
}
