//! `GET /health`

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use marquee_core::store::Store;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
  pub status:         &'static str,
  pub timestamp:      DateTime<Utc>,
  pub uptime_seconds: u64,
  pub version:        &'static str,
}

pub async fn handler<S>(State(state): State<AppState<S>>) -> Json<Health>
where
  S: Store + 'static,
{
  Json(Health {
    status:         "ok",
    timestamp:      Utc::now(),
    uptime_seconds: state.started_at.elapsed().as_secs(),
    version:        env!("CARGO_PKG_VERSION"),
  })
}
