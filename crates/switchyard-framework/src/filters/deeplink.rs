use std::string::FromUtf8Error;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

use switchyard_core::Update;

use crate::context::Context;
use crate::error::BoxError;
use crate::filter::Filter;

/// A deep-link payload, stashed by [`DeeplinkFilter`] and
/// [`CommandStart`](crate::CommandStart).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deeplink {
    pub payload: String,
}

/// Why an encoded deep-link payload could not be read.
#[derive(Debug, Error)]
pub enum DeeplinkError {
    #[error("failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded payload is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Encodes a payload with the URL-safe base64 alphabet, without padding.
pub fn encode_payload(payload: &str) -> String {
    URL_SAFE_NO_PAD.encode(payload)
}

/// Decodes a URL-safe base64 payload. Trailing padding is optional.
pub fn decode_payload(encoded: &str) -> Result<String, DeeplinkError> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?;
    Ok(String::from_utf8(bytes)?)
}

/// Reads a raw payload, decoding it first when `encoded` is set.
pub(crate) fn read_payload(raw: &str, encoded: bool) -> Result<Deeplink, DeeplinkError> {
    let payload = if encoded {
        decode_payload(raw)?
    } else {
        raw.to_string()
    };
    Ok(Deeplink { payload })
}

/// Matches `bot_started` updates that carry a non-empty start payload.
///
/// With [`encoded`](Self::encoded) set the payload is base64-decoded before it
/// is stashed. A payload that fails to decode is a filter error, not a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeeplinkFilter {
    encoded: bool,
}

impl DeeplinkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the payload as URL-safe base64.
    pub fn encoded(mut self, encoded: bool) -> Self {
        self.encoded = encoded;
        self
    }
}

#[async_trait]
impl Filter for DeeplinkFilter {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        let Update::BotStarted(started) = update else {
            return Ok(false);
        };
        match started.payload.as_deref() {
            Some(payload) if !payload.is_empty() => {
                ctx.insert(read_payload(payload, self.encoded)?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
