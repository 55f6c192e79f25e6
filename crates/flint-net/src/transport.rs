//! Plain-TCP and TLS connection plumbing.

use flint_core::EngineError;
use flint_core::EngineResult;
use std::io::Read;
use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

#[cfg(feature = "tls-rustls")]
use std::sync::Arc;

const IO_TIMEOUT: Duration = Duration::from_secs(15);

/// One outbound connection, plaintext or TLS.
pub(crate) enum Transport {
    Plain(TcpStream),
    #[cfg(feature = "tls-rustls")]
    Tls(Box<rustls::StreamOwned<rustls::ClientConnection, TcpStream>>),
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            #[cfg(feature = "tls-rustls")]
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            #[cfg(feature = "tls-rustls")]
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            #[cfg(feature = "tls-rustls")]
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Connects to `host:port`, wrapping the stream in TLS for `https`.
pub(crate) fn connect(scheme: &str, host: &str, port: u16) -> EngineResult<Transport> {
    let stream = TcpStream::connect((host, port)).map_err(|error| {
        EngineError::new(
            "net.connect_failed",
            format!("connecting to {host}:{port} failed: {error}"),
        )
    })?;
    let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
    let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

    match scheme {
        "http" => Ok(Transport::Plain(stream)),
        "https" => tls_wrap(host, stream),
        other => Err(EngineError::new(
            "net.scheme_unsupported",
            format!("no transport for scheme `{other}`"),
        )),
    }
}

#[cfg(feature = "tls-rustls")]
fn tls_wrap(host: &str, stream: TcpStream) -> EngineResult<Transport> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let server_name =
        rustls::pki_types::ServerName::try_from(host.to_owned()).map_err(|error| {
            EngineError::new(
                "net.tls_name_invalid",
                format!("`{host}` is not a valid TLS server name: {error}"),
            )
        })?;

    let connection =
        rustls::ClientConnection::new(Arc::new(config), server_name).map_err(|error| {
            EngineError::new(
                "net.tls_handshake_failed",
                format!("TLS session with {host} failed: {error}"),
            )
        })?;

    Ok(Transport::Tls(Box::new(rustls::StreamOwned::new(
        connection, stream,
    ))))
}

#[cfg(not(feature = "tls-rustls"))]
fn tls_wrap(host: &str, _stream: TcpStream) -> EngineResult<Transport> {
    Err(EngineError::new(
        "net.tls_unavailable",
        format!("https://{host} requires the `tls-rustls` feature"),
    ))
}
