//! Argument checks performed by the built-in transport
//!
//! These follow the WebSocket client rules: `http`/`https` URLs are
//! rewritten to `ws`/`wss`, fragments are refused, sub-protocols must be
//! unique HTTP tokens, and close frames carry either 1000 or an
//! application code with a reason of at most 123 bytes.

use crate::traits::TransportError;
use std::collections::HashSet;
use url::Url;

/// Longest close reason that fits a control frame alongside the code
pub const MAX_CLOSE_REASON_BYTES: usize = 123;

/// Resolve a URL string into the absolute `ws`/`wss` URL to connect to
pub fn resolve_url(raw: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw)
        .map_err(|e| TransportError::Syntax(format!("invalid URL '{}': {}", raw, e)))?;

    let rewritten = match url.scheme() {
        "ws" | "wss" => None,
        "http" => Some("ws"),
        "https" => Some("wss"),
        other => {
            return Err(TransportError::Syntax(format!(
                "scheme '{}' is not allowed, expected ws or wss",
                other
            )))
        }
    };

    if let Some(scheme) = rewritten {
        // http <-> ws are both special schemes, so this cannot fail
        let _ = url.set_scheme(scheme);
    }

    if url.fragment().is_some() {
        return Err(TransportError::Syntax(format!(
            "URL '{}' must not contain a fragment",
            raw
        )));
    }

    Ok(url)
}

/// Check a sub-protocol list for token grammar and duplicates
pub fn check_protocols(protocols: &[String]) -> Result<(), TransportError> {
    let mut seen = HashSet::with_capacity(protocols.len());

    for protocol in protocols {
        if !is_token(protocol) {
            return Err(TransportError::Syntax(format!(
                "'{}' is not a valid sub-protocol token",
                protocol
            )));
        }
        if !seen.insert(protocol.as_str()) {
            return Err(TransportError::Syntax(format!(
                "sub-protocol '{}' is listed more than once",
                protocol
            )));
        }
    }

    Ok(())
}

/// Check a close code and reason before starting the closing handshake
pub fn check_close(code: u16, reason: &str) -> Result<(), TransportError> {
    if code != 1000 && !(3000..=4999).contains(&code) {
        return Err(TransportError::InvalidAccess(code));
    }
    if reason.len() > MAX_CLOSE_REASON_BYTES {
        return Err(TransportError::ReasonSyntax(reason.len()));
    }
    Ok(())
}

fn is_token(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(is_tchar)
}

#[inline]
fn is_tchar(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}
