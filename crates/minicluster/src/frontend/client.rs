//! Session clients for both transports.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::error::FrontendError;
use super::http::{ErrorResponse, OpenSessionRequest, OpenSessionResponse, route_base};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// An open session on a front-end server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: String,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn open_session(&self, user: &str, password: &str)
    -> Result<SessionHandle, FrontendError>;

    async fn close_session(&self, session: SessionHandle) -> Result<(), FrontendError>;
}

/// Client for the line protocol; every request uses its own connection.
#[derive(Debug, Clone)]
pub struct BinarySessionClient {
    addr: SocketAddr,
}

impl BinarySessionClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    async fn request(&self, line: &str) -> Result<String, FrontendError> {
        tokio::time::timeout(REQUEST_TIMEOUT, self.exchange(line))
            .await
            .map_err(|_| FrontendError::Io {
                context: format!("request to {}", self.addr),
                reason: "timed out".to_string(),
            })?
    }

    async fn exchange(&self, line: &str) -> Result<String, FrontendError> {
        let stream = TcpStream::connect(self.addr)
            .await
            .map_err(|e| FrontendError::from_io_error(e, "connect"))?;
        let (reader, mut writer) = stream.into_split();

        writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| FrontendError::from_io_error(e, "send request"))?;

        let reply = BufReader::new(reader)
            .lines()
            .next_line()
            .await
            .map_err(|e| FrontendError::from_io_error(e, "read reply"))?;
        reply.ok_or_else(|| FrontendError::Protocol {
            reason: "connection closed before reply".to_string(),
        })
    }
}

/// Map an `ERR <code> <message>` reply back to an error.
fn parse_error_reply(reply: &str, session_id: Option<&str>) -> FrontendError {
    let mut parts = reply.splitn(3, ' ');
    let _ = parts.next();
    let code = parts.next().unwrap_or("");
    let message = parts.next().unwrap_or(reply).to_string();
    match (code, session_id) {
        ("session_not_found", Some(id)) => FrontendError::SessionNotFound {
            session_id: id.to_string(),
        },
        ("invalid_credentials", _) => FrontendError::InvalidCredentials { reason: message },
        _ => FrontendError::Protocol { reason: message },
    }
}

#[async_trait]
impl SessionClient for BinarySessionClient {
    async fn open_session(
        &self,
        user: &str,
        password: &str,
    ) -> Result<SessionHandle, FrontendError> {
        let reply = self.request(&format!("OPEN {user} {password}")).await?;
        match reply.strip_prefix("OK ") {
            Some(id) if !id.trim().is_empty() => Ok(SessionHandle::new(id.trim())),
            _ => Err(parse_error_reply(&reply, None)),
        }
    }

    async fn close_session(&self, session: SessionHandle) -> Result<(), FrontendError> {
        let reply = self.request(&format!("CLOSE {}", session.id())).await?;
        if reply.trim() == "OK" {
            Ok(())
        } else {
            Err(parse_error_reply(&reply, Some(session.id())))
        }
    }
}

/// Client for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionClient {
    pub fn new(addr: SocketAddr, http_path: &str) -> Result<Self, FrontendError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FrontendError::from_http_error(e, "build HTTP client"))?;
        Ok(Self {
            client,
            base_url: format!("http://{addr}{}", route_base(http_path)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn error_from_response(response: reqwest::Response) -> FrontendError {
    let status = response.status().as_u16();
    match response.json::<ErrorResponse>().await {
        Ok(body) => match body.error.as_str() {
            "invalid_credentials" => FrontendError::InvalidCredentials {
                reason: body.message,
            },
            _ => FrontendError::Http {
                status,
                message: body.message,
            },
        },
        Err(e) => FrontendError::Http {
            status,
            message: format!("unreadable error body: {e}"),
        },
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn open_session(
        &self,
        user: &str,
        password: &str,
    ) -> Result<SessionHandle, FrontendError> {
        let response = self
            .client
            .post(format!("{}/sessions", self.base_url))
            .json(&OpenSessionRequest {
                user: user.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(|e| FrontendError::from_http_error(e, "open session"))?;

        if response.status() != reqwest::StatusCode::CREATED {
            return Err(error_from_response(response).await);
        }
        let body: OpenSessionResponse = response
            .json()
            .await
            .map_err(|e| FrontendError::from_http_error(e, "decode session"))?;
        Ok(SessionHandle::new(body.session_id))
    }

    async fn close_session(&self, session: SessionHandle) -> Result<(), FrontendError> {
        let response = self
            .client
            .delete(format!("{}/sessions/{}", self.base_url, session.id()))
            .send()
            .await
            .map_err(|e| FrontendError::from_http_error(e, "close session"))?;

        match response.status() {
            reqwest::StatusCode::NO_CONTENT => Ok(()),
            reqwest::StatusCode::NOT_FOUND => Err(FrontendError::SessionNotFound {
                session_id: session.id().to_string(),
            }),
            _ => Err(error_from_response(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_reply() {
        assert!(matches!(
            parse_error_reply("ERR session_not_found Session 'x' not found", Some("x")),
            FrontendError::SessionNotFound { session_id } if session_id == "x"
        ));
        assert!(matches!(
            parse_error_reply("ERR invalid_credentials Session rejected", None),
            FrontendError::InvalidCredentials { .. }
        ));
        assert!(matches!(
            parse_error_reply("garbage", None),
            FrontendError::Protocol { .. }
        ));
    }

    #[test]
    fn test_http_base_url() {
        let addr: SocketAddr = "127.0.0.1:10001".parse().unwrap();
        let client = HttpSessionClient::new(addr, "cliservice").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:10001/cliservice");
    }

    #[tokio::test]
    async fn test_binary_client_against_closed_port_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let error = BinarySessionClient::new(addr)
            .open_session("foo", "bar")
            .await
            .unwrap_err();
        assert!(error.is_transient());
    }
}
