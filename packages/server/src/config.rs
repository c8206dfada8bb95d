//! サーバー設定
//!
//! コマンドライン引数（環境変数でも指定可）を `ServerConfig` にまとめる。
//! プロトコル名や CORS オリジンが不正なら起動前にエラーにする。

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    domain::{SyncProtocol, UnknownProtocol},
    infrastructure::transport::TransportOptions,
};

const DEFAULT_CORS_ALLOW_ORIGINS: &str = "http://localhost:3000,http://localhost:5173,http://localhost:8080,http://127.0.0.1:3000,http://127.0.0.1:5173,http://127.0.0.1:8080";

/// 起動時の設定エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownProtocol(#[from] UnknownProtocol),

    #[error("invalid CORS origin: '{0}'")]
    InvalidCorsOrigin(String),

    #[error("heartbeat interval must be at least one second")]
    InvalidHeartbeat,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "syncplay-server")]
#[command(about = "Playback sync server relaying room state over WebSocket or SSE", long_about = None)]
pub struct ServerArgs {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Sync transport: "websocket" or "sse"
    #[arg(long, env = "SYNC_PROTOCOL", default_value = "websocket")]
    pub protocol: String,

    /// Seconds between SSE heartbeat comments
    #[arg(long, env = "SYNC_HEARTBEAT_SECS", default_value_t = 30)]
    pub heartbeat_secs: u64,

    /// Seconds to wait for live connections to close on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "CORS_ALLOW_ORIGINS", default_value = DEFAULT_CORS_ALLOW_ORIGINS)]
    pub cors_allow_origins: String,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// 検証済みのサーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol: SyncProtocol,
    pub transport: TransportOptions,
    pub shutdown_timeout: Duration,
    pub cors_allow_origins: Vec<HeaderValue>,
    pub log_level: String,
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let protocol = args.protocol.parse::<SyncProtocol>()?;

        if args.heartbeat_secs == 0 {
            return Err(ConfigError::InvalidHeartbeat);
        }

        let cors_allow_origins = args
            .cors_allow_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ConfigError::InvalidCorsOrigin(origin.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            host: args.host,
            port: args.port,
            protocol,
            transport: TransportOptions {
                heartbeat_interval: Duration::from_secs(args.heartbeat_secs),
            },
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
            cors_allow_origins,
            log_level: args.log_level,
        })
    }
}

impl ServerConfig {
    /// 許可リストに基づく CORS レイヤー（資格情報付きリクエストを許可）
    pub fn cors_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.cors_allow_origins.clone()))
            .allow_credentials(true)
            .allow_headers([
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
                header::COOKIE,
            ])
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ServerConfig, ConfigError> {
        let mut argv = vec!["syncplay-server"];
        argv.extend_from_slice(args);
        ServerConfig::try_from(ServerArgs::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_defaults() {
        // テスト項目: 引数なしならデフォルト値になる
        // given (前提条件):
        let args = ServerArgs::try_parse_from(["syncplay-server"]).unwrap();

        // when (操作):
        let config = ServerConfig::try_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.port, 3000);
        assert_eq!(config.protocol, SyncProtocol::WebSocket);
        assert_eq!(config.transport.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.cors_allow_origins.len(), 6);
    }

    #[test]
    fn test_sse_protocol_and_origins() {
        // テスト項目: プロトコルとオリジンの指定が反映される
        // when (操作):
        let config = parse(&[
            "--protocol",
            "SSE",
            "--cors-allow-origins",
            "https://a.example, https://b.example,",
        ])
        .unwrap();

        // then (期待する結果):
        assert_eq!(config.protocol, SyncProtocol::Sse);
        assert_eq!(
            config.cors_allow_origins,
            vec![
                HeaderValue::from_static("https://a.example"),
                HeaderValue::from_static("https://b.example"),
            ]
        );
    }

    #[test]
    fn test_unknown_protocol_is_fatal() {
        // テスト項目: 未知のプロトコル名は設定エラーになる
        // when (操作):
        let result = parse(&["--protocol", "grpc"]);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ConfigError::UnknownProtocol(UnknownProtocol("grpc".to_string()))
        );
    }

    #[test]
    fn test_zero_heartbeat_is_rejected() {
        // テスト項目: ハートビート間隔 0 は拒否される
        // when (操作):
        let result = parse(&["--heartbeat-secs", "0"]);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ConfigError::InvalidHeartbeat);
    }
}
