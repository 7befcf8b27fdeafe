//! Connection strings for a running front end.

use crate::config::TransportMode;

pub const URL_SCHEME: &str = "jdbc:minicluster";
pub const DEFAULT_DATABASE: &str = "default";
pub const DEFAULT_HTTP_PATH: &str = "cliservice";

/// Connection properties every HTTP-transport endpoint carries.
pub const HTTP_TRANSPORT_PROPERTIES: &str = "server.transport.mode=http;server.http.path=cliservice;";

/// Everything an endpoint is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec<'a> {
    pub host: &'a str,
    pub transport: TransportMode,
    pub binary_port: u16,
    pub http_port: u16,
    /// Server principal, present under simulated authentication.
    pub principal: Option<&'a str>,
    pub database: &'a str,
    pub session_extension: &'a str,
    pub connection_extension: &'a str,
}

impl EndpointSpec<'_> {
    pub fn port(&self) -> u16 {
        match self.transport {
            TransportMode::Http => self.http_port,
            TransportMode::Binary => self.binary_port,
        }
    }
}

/// `jdbc:minicluster://<host>:<port>`
pub fn base_endpoint(host: &str, port: u16) -> String {
    format!("{URL_SCHEME}://{host}:{port}")
}

/// `<base>/<db>[;principal=<p>]<session-ext>[?<props>]`
///
/// HTTP transport prepends its transport properties to the caller's
/// connection extension. The `?` appears only when the properties are not
/// blank; they are appended exactly as given.
pub fn build_endpoint(spec: &EndpointSpec<'_>) -> String {
    let mut url = format!(
        "{}/{}",
        base_endpoint(spec.host, spec.port()),
        spec.database
    );

    if let Some(principal) = spec.principal {
        url.push_str(";principal=");
        url.push_str(principal);
    }
    url.push_str(spec.session_extension);

    let properties = match spec.transport {
        TransportMode::Http => format!("{HTTP_TRANSPORT_PROPERTIES}{}", spec.connection_extension),
        TransportMode::Binary => spec.connection_extension.to_string(),
    };
    if !properties.trim().is_empty() {
        url.push('?');
        url.push_str(&properties);
    }
    url
}
