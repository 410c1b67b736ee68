use std::net::IpAddr;
use std::path::Path;

use reqwest::Url;

use crate::error::CoreError;

pub(super) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
) -> Result<Option<(String, String)>, CoreError> {
    match (user, pass) {
        (Some(u), Some(p)) => Ok(Some((u.to_owned(), p.to_owned()))),
        (Some(_), None) | (None, Some(_)) => Err(CoreError::Config(
            "both rpc user and rpc pass must be set together".to_owned(),
        )),
        (None, None) => Ok(None),
    }
}

/// Validate an RPC endpoint URL.
///
/// Plain `http` is only accepted for loopback hosts; anything reachable over
/// the network must use TLS.
pub(super) fn parse_connection(connection: &str) -> Result<Url, CoreError> {
    let parsed = Url::parse(connection).map_err(|e| {
        CoreError::Config(format!(
            "invalid connection `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if is_loopback(&parsed) => Ok(parsed),
        "http" => Err(CoreError::Config(format!(
            "plain HTTP to `{connection}` is only allowed for localhost; use https"
        ))),
        other => Err(CoreError::Config(format!(
            "unsupported connection scheme `{other}`; expected http or https"
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

/// Read a PEM certificate used to trust a daemon's self-signed RPC cert.
pub(super) fn load_certificate(cert_file: &Path) -> Result<reqwest::Certificate, CoreError> {
    let pem = std::fs::read(cert_file).map_err(|e| {
        CoreError::Config(format!(
            "failed to read rpc certificate {}: {e}",
            cert_file.display()
        ))
    })?;
    reqwest::Certificate::from_pem(&pem).map_err(|e| {
        CoreError::Config(format!(
            "rpc certificate {} is not valid PEM: {e}",
            cert_file.display()
        ))
    })
}
