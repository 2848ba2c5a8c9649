//! Alexa Skill Lambda - Answers parish questions by voice.
//!
//! Mass times, the next mass (with a reminder offer), confession, the parish
//! calendar and office phone, plus homily and talk playback.

mod envelope;
mod handlers;
mod session;

use chrono::Utc;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::{AlexaReminderClient, Config, DynamoStore, ParishData, ParishStore, ReminderService};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use envelope::{RequestEnvelope, ResponseEnvelope};

pub struct AppState {
    config: Config,
    data: ParishData,
    reminders: Arc<dyn ReminderService>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let store = DynamoStore::from_config(&config).await;
        let reminders = AlexaReminderClient::new(reqwest::Client::new());

        info!(
            table = %config.table_name,
            timezone = %config.timezone,
            skill_id_checked = config.skill_id.is_some(),
            "Skill configured"
        );

        Ok(Self::from_parts(config, Arc::new(store), Arc::new(reminders)))
    }

    fn from_parts(config: Config, store: Arc<dyn ParishStore>, reminders: Arc<dyn ReminderService>) -> Self {
        Self {
            config,
            data: ParishData::new(store),
            reminders,
        }
    }
}

async fn handler(
    state: Arc<AppState>,
    event: LambdaEvent<RequestEnvelope>,
) -> Result<ResponseEnvelope, Error> {
    let envelope = event.payload;
    info!(
        request_id = %event.context.request_id,
        request_type = envelope.request.kind(),
        "Handling Alexa request"
    );

    let response = match handlers::handle(&state, &envelope, Utc::now()).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, external = e.is_external(), "Request failed");
            handlers::error_response()
        }
    };

    debug!(response = ?response, "Responding");
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
