//! Request header assembly and validation

use crate::config::HttpUploadParams;
use crate::error::{Error, Result};
use crate::types::Header;

/// `User-Agent` header name
pub const USER_AGENT: &str = "User-Agent";

/// `Content-Type` header name
pub const CONTENT_TYPE: &str = "Content-Type";

/// User-Agent sent when the caller does not supply one
pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// The caller's User-Agent if non-blank, the library default otherwise
pub fn effective_user_agent(custom: Option<&str>) -> String {
    match custom {
        Some(agent) if !agent.trim().is_empty() => agent.to_string(),
        _ => default_user_agent(),
    }
}

/// Replace every header named `name` (case-insensitively) with a single one
pub fn set_header(headers: &mut Vec<Header>, name: &str, value: impl Into<String>) {
    headers.retain(|header| !header.is_named(name));
    headers.push(Header::new(name, value));
}

/// Headers for one attempt: the caller's list, exactly one User-Agent, and a
/// Content-Type from the body when the caller did not set one
///
/// The caller's parameters are not modified. Nothing is validated here; see
/// [`validate_headers`].
pub fn request_headers(params: &HttpUploadParams, body_content_type: Option<String>) -> Vec<Header> {
    let mut headers = params.request_headers.clone();
    set_header(
        &mut headers,
        USER_AGENT,
        effective_user_agent(params.custom_user_agent.as_deref()),
    );

    if let Some(content_type) = body_content_type {
        if !headers.iter().any(|header| header.is_named(CONTENT_TYPE)) {
            headers.push(Header::new(CONTENT_TYPE, content_type));
        }
    }
    headers
}

/// Check that a header can be sent as-is
///
/// The name must be a non-empty HTTP token. The value must be US-ASCII with
/// no control characters other than horizontal tab.
pub fn validate_header(header: &Header) -> Result<()> {
    if header.name.is_empty() {
        return Err(Error::config_key("header name must not be empty", ""));
    }
    if !header.name.bytes().all(is_token_byte) {
        return Err(Error::config_key(
            format!("header name {:?} contains invalid characters", header.name),
            &header.name,
        ));
    }
    if !header
        .value
        .bytes()
        .all(|b| b == b'\t' || (b.is_ascii() && !b.is_ascii_control()))
    {
        return Err(Error::config_key(
            format!(
                "header {} must have a US-ASCII value without control characters",
                header.name
            ),
            &header.name,
        ));
    }
    Ok(())
}

/// Validate every header, failing on the first invalid one
pub fn validate_headers(headers: &[Header]) -> Result<()> {
    headers.iter().try_for_each(validate_header)
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
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

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn user_agents(headers: &[Header]) -> Vec<&str> {
        headers
            .iter()
            .filter(|h| h.is_named(USER_AGENT))
            .map(|h| h.value.as_str())
            .collect()
    }

    #[test]
    fn default_user_agent_names_the_library() {
        assert!(default_user_agent().starts_with("upload-service/"));
        assert_eq!(effective_user_agent(None), default_user_agent());
        assert_eq!(effective_user_agent(Some("  ")), default_user_agent());
        assert_eq!(effective_user_agent(Some("MyApp/2.0")), "MyApp/2.0");
    }

    #[test]
    fn exactly_one_user_agent_whatever_was_supplied() {
        let cases: Vec<Vec<Header>> = vec![
            vec![],
            vec![Header::new("User-Agent", "a")],
            vec![
                Header::new("user-agent", "a"),
                Header::new("X-Other", "1"),
                Header::new("USER-AGENT", "b"),
                Header::new("User-Agent", "c"),
            ],
        ];

        for supplied in cases {
            let params = HttpUploadParams {
                request_headers: supplied.clone(),
                custom_user_agent: Some("Custom/1".into()),
                ..HttpUploadParams::default()
            };
            let headers = request_headers(&params, None);
            assert_eq!(user_agents(&headers), vec!["Custom/1"], "for {supplied:?}");
        }
    }

    #[test]
    fn other_duplicates_are_kept_in_order() {
        let mut params = HttpUploadParams::default();
        params
            .add_header("X-Tag", "1")
            .add_header("x-tag", "2")
            .add_header("User-Agent", "old");

        let headers = request_headers(&params, None);

        assert_eq!(headers[0], Header::new("X-Tag", "1"));
        assert_eq!(headers[1], Header::new("x-tag", "2"));
        assert_eq!(headers.len(), 3);
        assert_eq!(user_agents(&headers), vec![default_user_agent().as_str()]);
        assert_eq!(params.request_headers.len(), 3, "params are not modified");
    }

    #[test]
    fn content_type_added_only_when_absent() {
        let params = HttpUploadParams::default();
        let headers = request_headers(&params, Some("image/png".into()));
        assert!(headers.contains(&Header::new(CONTENT_TYPE, "image/png")));

        let mut params = HttpUploadParams::default();
        params.add_header("content-type", "application/json");
        let headers = request_headers(&params, Some("image/png".into()));
        let types: Vec<_> = headers.iter().filter(|h| h.is_named(CONTENT_TYPE)).collect();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].value, "application/json");
    }

    #[test]
    fn validation_rejects_bad_headers() {
        for bad in [
            Header::new("", "v"),
            Header::new("Bad Name", "v"),
            Header::new("X:Colon", "v"),
            Header::new("X-Line", "a\nb"),
            Header::new("X-Cr", "a\rb"),
            Header::new("X-Nul", "a\0b"),
            Header::new("X-Ünï", "v"),
            Header::new("X-Value", "naïve"),
        ] {
            assert!(
                matches!(validate_header(&bad), Err(Error::Config { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn validation_accepts_ordinary_headers() {
        validate_headers(&[
            Header::new("Authorization", "Bearer abc.def"),
            Header::new("X-Custom_Header.v2", "a\tb c"),
            Header::new("Empty", ""),
        ])
        .unwrap();
    }

    #[test]
    fn validation_error_names_the_header() {
        match validate_headers(&[Header::new("Ok", "v"), Header::new("X-Bad", "\u{7f}")]) {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("X-Bad")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
