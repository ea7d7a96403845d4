//! marquee server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To produce an argon2 PHC string for seeding a user by hand:
//!
//! ```
//! cargo run -p marquee-server -- --hash-password
//! ```

mod config;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{
  Router,
  http::{HeaderValue, Method, header},
};
use clap::Parser;
use marquee_api::AppState;
use marquee_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  set_header::SetResponseHeaderLayer,
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{Overrides, ServerConfig};

#[derive(Parser)]
#[command(author, version, about = "Marquee movie subscription server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Override the bind host.
  #[arg(long)]
  host: Option<String>,

  /// Override the bind port.
  #[arg(short, long)]
  port: Option<u16>,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let hash = marquee_api::auth::hash_password(password)
      .await
      .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = config::load(cli.config, Overrides { host: cli.host, port: cli.port })?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!(path = %store_path.display(), quota = ?server_cfg.quota, "store opened");

  let state = AppState::new(Arc::new(store), server_cfg.quota);
  let app = build_app(marquee_api::api_router(state), &server_cfg)?;

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Wrap the API router with request tracing, CORS and security headers.
fn build_app(api: Router, cfg: &ServerConfig) -> anyhow::Result<Router> {
  let cors = if cfg.cors_origins.is_empty() {
    CorsLayer::permissive()
  } else {
    let origins = cfg
      .cors_origins
      .iter()
      .map(|o| {
        HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {o:?}"))
      })
      .collect::<anyhow::Result<Vec<_>>>()?;
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
      .allow_headers([header::CONTENT_TYPE])
  };

  Ok(
    api
      .layer(cors)
      .layer(SetResponseHeaderLayer::overriding(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
      ))
      .layer(SetResponseHeaderLayer::overriding(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY"),
      ))
      .layer(TraceLayer::new_for_http()),
  )
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for shutdown signal: {e}");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Read a password from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use axum::body::Body;
  use axum::http::{Request, StatusCode};
  use tower::ServiceExt as _;

  use super::*;

  async fn app(cfg: &ServerConfig) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(Arc::new(store), cfg.quota);
    build_app(marquee_api::api_router(state), cfg).unwrap()
  }

  #[tokio::test]
  async fn responses_carry_security_headers() {
    let resp = app(&ServerConfig::default())
      .await
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(resp.headers()[header::X_FRAME_OPTIONS], "DENY");
  }

  #[tokio::test]
  async fn configured_origins_are_allowed() {
    let cfg = ServerConfig {
      cors_origins: vec!["https://marquee.example.com".into()],
      ..ServerConfig::default()
    };
    let req = Request::get("/health")
      .header(header::ORIGIN, "https://marquee.example.com")
      .body(Body::empty())
      .unwrap();
    let resp = app(&cfg).await.oneshot(req).await.unwrap();
    assert_eq!(
      resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "https://marquee.example.com"
    );
  }

  #[test]
  fn bad_origin_is_rejected() {
    let cfg = ServerConfig {
      cors_origins: vec!["bad\norigin".into()],
      ..ServerConfig::default()
    };
    assert!(build_app(Router::new(), &cfg).is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let expanded = expand_tilde(Path::new("~/marquee.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join("marquee.db"));
    }
    assert_eq!(expand_tilde(Path::new("/tmp/m.db")), PathBuf::from("/tmp/m.db"));
  }
}
