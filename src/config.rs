use std::fmt;
#[cfg(unix)]
use std::path::PathBuf;

/// TCP address of the bus, `host:port`. Takes precedence over every other setting.
pub const ADDR_ENV: &str = "BROKER_ADDR";
/// Unix socket path of the bus.
pub const SOCKET_ENV: &str = "BROKER_SOCKET";

#[cfg(unix)]
pub const UNIX_PATH: &str = "/tmp/ipc_broker.sock";
#[cfg(windows)]
pub const PIPE_PATH: &str = r"\\.\pipe\ipc_broker";

/// Where the session bus can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusAddress {
    Tcp(String),
    #[cfg(unix)]
    Unix(PathBuf),
    #[cfg(windows)]
    NamedPipe(String),
}

impl BusAddress {
    /// Resolve the session bus from the environment.
    ///
    /// `BROKER_ADDR` selects TCP. Otherwise the platform's local transport is
    /// used: `BROKER_SOCKET` or [`UNIX_PATH`] on Unix, [`PIPE_PATH`] on Windows.
    pub fn session() -> Self {
        Self::from_vars(
            std::env::var(ADDR_ENV).ok(),
            std::env::var(SOCKET_ENV).ok(),
        )
    }

    fn from_vars(addr: Option<String>, socket: Option<String>) -> Self {
        if let Some(ip) = addr.filter(|a| !a.is_empty()) {
            return BusAddress::Tcp(ip);
        }

        #[cfg(unix)]
        {
            let path = socket
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNIX_PATH.to_string());
            BusAddress::Unix(PathBuf::from(path))
        }

        #[cfg(windows)]
        {
            let _ = socket;
            BusAddress::NamedPipe(PIPE_PATH.to_string())
        }
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusAddress::Tcp(addr) => write!(f, "tcp:{addr}"),
            #[cfg(unix)]
            BusAddress::Unix(path) => write!(f, "unix:{}", path.display()),
            #[cfg(windows)]
            BusAddress::NamedPipe(name) => write!(f, "pipe:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_address_wins() {
        let addr = BusAddress::from_vars(Some("127.0.0.1:5000".into()), Some("/x.sock".into()));
        assert_eq!(addr, BusAddress::Tcp("127.0.0.1:5000".into()));
        assert_eq!(addr.to_string(), "tcp:127.0.0.1:5000");
    }

    #[cfg(unix)]
    #[test]
    fn unix_socket_defaults() {
        assert_eq!(
            BusAddress::from_vars(None, None),
            BusAddress::Unix(PathBuf::from(UNIX_PATH))
        );
        assert_eq!(
            BusAddress::from_vars(Some(String::new()), Some("/run/bus.sock".into())),
            BusAddress::Unix(PathBuf::from("/run/bus.sock"))
        );
    }
}
