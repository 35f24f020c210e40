use crate::error::{MulticamError, Result};
use std::path::PathBuf;
use url::{Host, Url};

const RTSP_DEFAULT_PORT: u16 = 554;

/// Where a camera's frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLocator {
    /// Network stream reachable at host:port
    Network { host: String, port: u16 },
    /// Local capture device such as /dev/video0
    Device(PathBuf),
}

impl StreamLocator {
    /// Parse a `stream_url` value.
    ///
    /// Bare integers are device indices (`"0"` is `/dev/video0`), absolute
    /// paths are devices, everything else must be a URL with a host.
    pub fn parse(stream_url: &str) -> Result<Self> {
        let trimmed = stream_url.trim();

        if let Ok(index) = trimmed.parse::<u32>() {
            return Ok(Self::Device(PathBuf::from(format!("/dev/video{}", index))));
        }

        if trimmed.starts_with('/') {
            return Ok(Self::Device(PathBuf::from(trimmed)));
        }

        let url = Url::parse(trimmed).map_err(|e| {
            MulticamError::MalformedConfig(format!("invalid stream url '{}': {}", trimmed, e))
        })?;

        // IPv6 literals are stored without brackets
        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => {
                return Err(MulticamError::MalformedConfig(format!(
                    "stream url '{}' has no host",
                    trimmed
                )))
            }
        };

        let port = match url.port_or_known_default() {
            Some(port) => port,
            None if url.scheme().eq_ignore_ascii_case("rtsp") => RTSP_DEFAULT_PORT,
            None => {
                return Err(MulticamError::MalformedConfig(format!(
                    "stream url '{}' has no port and scheme {} has no default",
                    trimmed,
                    url.scheme()
                )))
            }
        };

        Ok(Self::Network { host, port })
    }

    /// Loggable form without credentials
    pub fn describe(&self) -> String {
        match self {
            Self::Network { host, port } if host.contains(':') => format!("[{}]:{}", host, port),
            Self::Network { host, port } => format!("{}:{}", host, port),
            Self::Device(path) => path.display().to_string(),
        }
    }
}
