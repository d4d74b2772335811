use url::form_urlencoded;

use crate::error::ServiceError;
use crate::ident::{HashVersion, LetterCase};

pub const PARAM_UPPERCASE: &str = "uppercase";
pub const PARAM_UUID_VERSION: &str = "uuidvers";
pub const PARAM_UUID_HASH_NS: &str = "uuidns";
pub const PARAM_UUID_HASH_NAME: &str = "uuidname";
pub const PARAM_SEQ: &str = "seq";

/// Per-request options, read once from the query string (GET) or the
/// url-encoded form body (POST).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub uppercase: bool,
    pub uuid_version: HashVersion,
    pub namespace: String,
    pub name: String,
    seq: Option<String>,
}

impl RequestOptions {
    /// Parse `application/x-www-form-urlencoded` pairs. Unknown keys are
    /// ignored; for repeated keys the first occurrence wins.
    #[must_use]
    pub fn from_urlencoded(input: &[u8]) -> Self {
        let mut opts = RequestOptions::default();
        let mut seen_version = false;
        let mut seen_uppercase = false;
        let mut seen_ns = false;
        let mut seen_name = false;
        for (key, value) in form_urlencoded::parse(input) {
            match &*key {
                PARAM_UPPERCASE if !seen_uppercase => {
                    seen_uppercase = true;
                    opts.uppercase = !value.is_empty();
                }
                PARAM_UUID_VERSION if !seen_version => {
                    seen_version = true;
                    opts.uuid_version = HashVersion::parse(&value).unwrap_or_default();
                }
                PARAM_UUID_HASH_NS if !seen_ns => {
                    seen_ns = true;
                    opts.namespace = value.into_owned();
                }
                PARAM_UUID_HASH_NAME if !seen_name => {
                    seen_name = true;
                    opts.name = value.into_owned();
                }
                PARAM_SEQ if opts.seq.is_none() => {
                    opts.seq = Some(value.into_owned());
                }
                _ => {}
            }
        }
        opts
    }

    /// Parse a request: the body for POST, the query string otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MalformedBody`] when a POST body is not UTF-8.
    pub fn from_request(
        method: &http::Method,
        query: Option<&str>,
        body: &[u8],
    ) -> Result<Self, ServiceError> {
        if method == http::Method::POST {
            if std::str::from_utf8(body).is_err() {
                return Err(ServiceError::MalformedBody(
                    "form body is not valid UTF-8".to_string(),
                ));
            }
            return Ok(Self::from_urlencoded(body));
        }
        Ok(Self::from_urlencoded(query.unwrap_or_default().as_bytes()))
    }

    #[must_use]
    pub fn letter_case(&self) -> LetterCase {
        LetterCase::from_uppercase_flag(self.uppercase)
    }

    /// Explicit v7 sequence value, if one was sent. An empty `seq` counts as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidSequence`] when `seq` is present but not
    /// a non-negative integer that fits in 64 bits.
    pub fn seq_override(&self) -> Result<Option<u64>, ServiceError> {
        match self.seq.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => {
                if !raw.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ServiceError::InvalidSequence(raw.to_string()));
                }
                raw.parse::<u64>()
                    .map(Some)
                    .map_err(|_| ServiceError::InvalidSequence(raw.to_string()))
            }
        }
    }

    #[must_use]
    pub fn has_hash_input(&self) -> bool {
        !self.namespace.is_empty() && !self.name.is_empty()
    }
}
