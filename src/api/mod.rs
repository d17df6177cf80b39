//! API handlers for Explore Events REST endpoints

pub mod categories;
pub mod comments;
pub mod compilations;
pub mod events;
pub mod health;
pub mod openapi;
pub mod requests;
pub mod stats;
pub mod users;

use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppError,
    models::{datetime, event::Page},
    AppState,
};

/// Address of the calling client, as recorded with view hits.
///
/// Proxy headers win over the socket address.
pub struct ClientIp(pub String);

fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "0.0.0.0".to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(client_ip(&parts.headers, remote)))
    }
}

/// `from` / `size` query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Number of items to skip (default 0)
    pub from: Option<i64>,
    /// Page length (default 10)
    pub size: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> Result<Page, AppError> {
        Page::new(self.from, self.size).map_err(AppError::Validation)
    }
}

/// Parse a `yyyy-MM-dd HH:mm:ss` query parameter
pub fn parse_datetime_param(name: &str, value: &str) -> Result<NaiveDateTime, AppError> {
    datetime::parse(value).map_err(|_| {
        AppError::InvalidArgument(format!(
            "Parameter {} must use the format yyyy-MM-dd HH:mm:ss, got '{}'",
            name, value
        ))
    })
}

pub fn parse_optional_datetime_param(
    name: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, AppError> {
    value.map(|v| parse_datetime_param(name, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        let remote: SocketAddr = "192.168.1.1:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(remote)), "10.0.0.1");
    }

    #[test]
    fn test_falls_back_to_socket_address() {
        let remote: SocketAddr = "192.168.1.1:5000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(remote)), "192.168.1.1");
        assert_eq!(client_ip(&HeaderMap::new(), None), "0.0.0.0");
    }

    #[test]
    fn test_page_params() {
        let params = PageParams {
            from: Some(25),
            size: Some(10),
        };
        assert_eq!(params.page().unwrap().offset(), 20);
        assert!(PageParams {
            from: None,
            size: Some(0)
        }
        .page()
        .is_err());
    }
}
