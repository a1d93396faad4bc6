//! Encoding options consulted by the variant selector.

use serde::{Deserialize, Serialize};

/// Knobs for [`crate::factory::create_with`].
///
/// Deserializes from JSON with every field optional:
///
/// ```rust
/// use colgroup_offsets::EncodingOptions;
///
/// let opts = EncodingOptions::from_json(r#"{ "verify": true }"#).unwrap();
/// assert!(opts.verify);
/// assert!(opts.allow_char);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingOptions {
    /// Re-scan every freshly built container and check its cached bounds.
    pub verify: bool,
    /// Allow the `u16` escape encoding when it is smaller than the byte one.
    pub allow_char: bool,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            verify: cfg!(debug_assertions),
            allow_char: true,
        }
    }
}

impl EncodingOptions {
    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns a copy with verification switched on or off.
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Returns a copy with the `u16` encoding allowed or forbidden.
    #[must_use]
    pub fn with_allow_char(mut self, allow_char: bool) -> Self {
        self.allow_char = allow_char;
        self
    }
}
