//! Byte-stream connections over TCP and TLS.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use super::endpoint::Endpoint;
use super::error::ConnectionError;

/// Any duplex byte stream a transport can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// Type-erased byte stream (TCP, TLS, or an in-memory pipe in tests).
pub type BoxedStream = Box<dyn AsyncStream>;

/// Dial the endpoint and wrap the socket in TLS when its scheme asks for it.
pub(crate) async fn open(endpoint: &Endpoint) -> Result<BoxedStream, ConnectionError> {
    let addr = endpoint.addr();
    let tcp = TcpStream::connect(&addr)
        .await
        .map_err(|source| ConnectionError::Connect {
            addr: addr.clone(),
            source,
        })?;
    if let Err(e) = tcp.set_nodelay(true) {
        warn!(error = %e, "failed to set TCP_NODELAY");
    }
    debug!(%addr, "tcp connected");

    if !endpoint.scheme().is_tls() {
        return Ok(Box::new(tcp));
    }

    let tls = upgrade_to_tls(tcp, endpoint.host()).await?;
    debug!(host = endpoint.host(), "tls established");
    Ok(Box::new(tls))
}

/// Run a client TLS handshake, verifying against the system roots.
async fn upgrade_to_tls(
    tcp: TcpStream,
    host: &str,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>, ConnectionError> {
    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| ConnectionError::ServerName(host.to_owned()))?;

    connector()
        .connect(server_name, tcp)
        .await
        .map_err(|source| ConnectionError::Tls {
            host: host.to_owned(),
            source,
        })
}

fn connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!(error = %e, "failed to add root cert");
        }
    }
    for e in &certs.errors {
        warn!(error = %e, "error loading native certs");
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}
