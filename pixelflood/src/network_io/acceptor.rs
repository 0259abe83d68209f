// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io,
          net::{Ipv4Addr, Ipv6Addr, SocketAddr},
          sync::Arc,
          time::{Duration, Instant}};

use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, error, warn};

use crate::{ConnectionSettings, PixelStore, RateLimiter, protocol_constants::LISTEN_BACKLOG,
            spawn_connection};

/// Which address families to listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMode {
    /// One IPv6 socket that also accepts IPv4 (as v4-mapped addresses). Falls back to
    /// IPv4 only when the host has no IPv6.
    #[default]
    DualStack,
    Ipv4Only,
    Ipv6Only,
}

/// After a failed `accept`, wait this long before the next one. Running out of file
/// descriptors makes `accept` fail immediately, over and over.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);
pub const ACCEPT_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BindError {
    #[error("Can't create a socket for {address}")]
    #[diagnostic(code(pixelflood::bind::socket))]
    Socket {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Can't configure the socket for {address}")]
    #[diagnostic(code(pixelflood::bind::configure))]
    Configure {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Can't listen on {address}")]
    #[diagnostic(
        code(pixelflood::bind::listen),
        help("Is another server already using this port? Pick another one with --port")
    )]
    Listen {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Bind the listening socket. Port `0` picks a free port, see
/// [`TcpListener::local_addr`].
///
/// # Errors
///
/// [`BindError`] if the socket can't be created, configured, bound, or put into the
/// listening state.
pub fn try_bind(port: u16, mode: BindMode) -> Result<TcpListener, BindError> {
    let v4 = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
    match mode {
        BindMode::Ipv4Only => listen_on(v4, None),
        BindMode::Ipv6Only => listen_on(v6, Some(true)),
        BindMode::DualStack => match listen_on(v6, Some(false)) {
            Ok(listener) => Ok(listener),
            Err(
                BindError::Socket { source, .. }
                | BindError::Configure { source, .. }
                | BindError::Listen { source, .. },
            ) if is_ipv6_unavailable(&source) => {
                warn!(message = "No IPv6 on this host, listening on IPv4 only", %source);
                listen_on(v4, None)
            }
            Err(error) => Err(error),
        },
    }
}

/// Errors that mean the host can't do IPv6 at all (no kernel support, or IPv6 disabled
/// so that `::` isn't a local address), as opposed to a problem with the port.
#[must_use]
pub fn is_ipv6_unavailable(error: &io::Error) -> bool {
    #[cfg(unix)]
    {
        use rustix::io::Errno;
        if let Some(errno) = Errno::from_io_error(error) {
            return matches!(
                errno,
                Errno::AFNOSUPPORT | Errno::ADDRNOTAVAIL | Errno::PROTONOSUPPORT
            );
        }
    }
    matches!(
        error.kind(),
        io::ErrorKind::AddrNotAvailable | io::ErrorKind::Unsupported
    )
}

/// Errors from `accept` that are about one connection or a momentary lack of resources.
/// Anything else means the listening socket itself is broken.
#[must_use]
pub fn is_transient_accept_error(error: &io::Error) -> bool {
    #[cfg(unix)]
    {
        use rustix::io::Errno;
        if let Some(errno) = Errno::from_io_error(error) {
            return matches!(
                errno,
                Errno::CONNABORTED
                    | Errno::MFILE
                    | Errno::NFILE
                    | Errno::NOBUFS
                    | Errno::NOMEM
                    | Errno::INTR
            );
        }
    }
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::Interrupted
            | io::ErrorKind::OutOfMemory
    )
}

fn listen_on(address: SocketAddr, v6_only: Option<bool>) -> Result<TcpListener, BindError> {
    let socket = match address {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(|source| BindError::Socket { address, source })?;

    let configure = |source| BindError::Configure { address, source };
    socket.set_reuseaddr(true).map_err(configure)?;
    if let Some(v6_only) = v6_only {
        set_v6_only(&socket, v6_only).map_err(configure)?;
    }

    socket
        .bind(address)
        .and_then(|()| socket.listen(LISTEN_BACKLOG))
        .map_err(|source| BindError::Listen { address, source })
}

#[cfg(unix)]
fn set_v6_only(socket: &TcpSocket, v6_only: bool) -> io::Result<()> {
    rustix::net::sockopt::set_ipv6_v6only(socket, v6_only).map_err(io::Error::from)
}

/// Elsewhere the OS default applies.
#[cfg(not(unix))]
fn set_v6_only(_socket: &TcpSocket, _v6_only: bool) -> io::Result<()> { Ok(()) }

/// Accept clients until the task is dropped, spawning one [`spawn_connection`] task
/// each. A transient `accept` failure (see [`is_transient_accept_error`]) is logged and
/// retried after [`ACCEPT_ERROR_BACKOFF`].
///
/// # Errors
///
/// Any other `accept` error: the listening socket is unusable, and the server can't go
/// on. This function never returns `Ok`.
pub async fn accept_forever(
    listener: TcpListener,
    store: Arc<dyn PixelStore>,
    settings: ConnectionSettings,
) -> io::Result<()> {
    let mut error_log_limiter = RateLimiter::new(ACCEPT_ERROR_LOG_INTERVAL);
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                spawn_connection(stream, peer, Arc::clone(&store), settings);
            }
            Err(error) if is_transient_accept_error(&error) => {
                if error_log_limiter
                    .get_status_and_update_last_run(Instant::now())
                    .is_allowed()
                {
                    warn!(message = "Failed to accept a connection", %error);
                } else {
                    debug!(message = "Failed to accept a connection", %error);
                }
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
            Err(error) => {
                error!(message = "Listening socket failed", %error);
                return Err(error);
            }
        }
    }
}
