//! Connection endpoints.
//!
//! An endpoint is written as a URL whose scheme picks the transport:
//!
//! | scheme  | transport          | default port |
//! |---------|--------------------|--------------|
//! | `irc`   | plain TCP          | 6667         |
//! | `ircs`  | TLS                | 6697         |
//! | `ws`    | WebSocket          | 80           |
//! | `wss`   | WebSocket over TLS | 443          |

use std::fmt;
use std::str::FromStr;

use url::Url;

use super::error::ConnectionError;

/// Twitch's WebSocket chat endpoint.
pub const TWITCH_WEBSOCKET: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Transport selected by an endpoint's URL scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `irc://`
    Irc,
    /// `ircs://`
    Ircs,
    /// `ws://`
    Ws,
    /// `wss://`
    Wss,
}

impl Scheme {
    /// Port used when the URL does not name one.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Irc => 6667,
            Self::Ircs => 6697,
            Self::Ws => 80,
            Self::Wss => 443,
        }
    }

    /// True if the byte stream is wrapped in TLS.
    pub fn is_tls(self) -> bool {
        matches!(self, Self::Ircs | Self::Wss)
    }

    /// True if lines travel as WebSocket text frames.
    pub fn is_websocket(self) -> bool {
        matches!(self, Self::Ws | Self::Wss)
    }

    /// Lowercase scheme name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Irc => "irc",
            Self::Ircs => "ircs",
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }

    fn from_url_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "irc" => Some(Self::Irc),
            "ircs" => Some(Self::Ircs),
            "ws" => Some(Self::Ws),
            "wss" => Some(Self::Wss),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, connectable server address.
///
/// ```
/// use kneiss_proto::{Endpoint, Scheme};
///
/// let endpoint: Endpoint = "ircs://irc.chat.twitch.tv".parse().unwrap();
/// assert_eq!(endpoint.scheme(), Scheme::Ircs);
/// assert_eq!(endpoint.port(), 6697);
/// assert_eq!(endpoint.addr(), "irc.chat.twitch.tv:6697");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
    url: Url,
}

impl Endpoint {
    /// Parse an endpoint URL.
    pub fn parse(input: &str) -> Result<Self, ConnectionError> {
        let invalid = |reason: &str| ConnectionError::InvalidEndpoint {
            endpoint: input.to_owned(),
            reason: reason.to_owned(),
        };

        let url = Url::parse(input).map_err(|e| invalid(&e.to_string()))?;
        let scheme = Scheme::from_url_scheme(url.scheme())
            .ok_or_else(|| invalid("scheme must be one of irc, ircs, ws, wss"))?;
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_owned(),
            _ => return Err(invalid("missing host")),
        };
        // ws/wss default ports are normalised away by the url crate
        let port = url.port().unwrap_or_else(|| scheme.default_port());

        Ok(Self {
            scheme,
            host,
            port,
            url,
        })
    }

    /// Transport scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, defaulted from the scheme when the URL has none.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for `TcpStream::connect`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The full URL, used as the WebSocket request target.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl FromStr for Endpoint {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}
