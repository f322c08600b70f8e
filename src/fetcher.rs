use crate::backend::read_json;
use crate::config::Source;
use crate::errors::FetchError;
use crate::models::Violation;
use crate::normalize::{is_present, normalize_batch};
use crate::state::AppState;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::{fs, sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info};

const WRAPPER_KEYS: [&str; 4] = ["data", "results", "violations", "predictions"];

/// Extracts the record array from a feed payload: either a bare array or an
/// object carrying it under one of the known wrapper keys.
pub fn unwrap_payload(payload: Value) -> Result<Vec<Value>, FetchError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut fields) => {
            let wrapped = WRAPPER_KEYS
                .iter()
                .find_map(|key| fields.remove(*key).filter(is_present));
            match wrapped {
                Some(Value::Array(items)) => Ok(items),
                Some(_) => Err(FetchError::NotAnArray),
                None => Ok(Vec::new()),
            }
        }
        _ => Err(FetchError::NotAnArray),
    }
}

pub async fn fetch_once(
    client: &Client,
    source: &Source,
    bearer: Option<&str>,
) -> Result<Vec<Violation>, FetchError> {
    let payload: Value = match source {
        Source::File(path) => {
            let bytes = fs::read(path).await?;
            serde_json::from_slice(&bytes)?
        }
        Source::Api(url) => {
            let mut request = client.get(url);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }
            read_json(request.send().await?).await?
        }
    };

    let raw = unwrap_payload(payload)?;
    Ok(normalize_batch(&raw, Utc::now()))
}

/// Runs one fetch cycle and publishes the outcome to the store.
pub async fn refresh(state: &AppState, client: &Client) {
    let bearer = state.auth.bearer_token().await;
    match fetch_once(client, &state.config.source, bearer.as_deref()).await {
        Ok(batch) => {
            debug!(count = batch.len(), "violations refreshed");
            state.violations.replace_batch(batch).await;
        }
        Err(err) => {
            error!("failed to fetch violations: {err}");
            state.violations.record_failure(err.to_string()).await;
        }
    }
}

/// Handle to the periodic refresh task.
pub struct Poller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Starts polling. The first cycle runs immediately; cycles never overlap.
    pub fn start(state: AppState, client: Client, interval: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => refresh(&state, &client).await,
                    _ = stop.changed() => break,
                }
            }
            info!("violation poller stopped");
        });

        info!(interval_secs = interval.as_secs_f64(), "violation poller started");
        Self { shutdown, handle }
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            error!("violation poller task failed: {err}");
        }
    }
}
