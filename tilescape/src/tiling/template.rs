//! Tile URL templating.
//!
//! Templates are plain strings containing `{z}`, `{x}` and `{y}` exactly once
//! each, plus `{t}` at most once (required for layers with a time
//! dimension). Substitution is literal and uses decimal integers. A template
//! is only validated when it is resolved, so a layer with a broken template
//! can still be constructed and inspected.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Zoom level token.
pub const TOKEN_Z: &str = "{z}";
/// Column token.
pub const TOKEN_X: &str = "{x}";
/// Row token.
pub const TOKEN_Y: &str = "{y}";
/// Time step token.
pub const TOKEN_T: &str = "{t}";

/// Errors raised when a template cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A required token does not appear in the template.
    #[error("Layer url '{template}' has no {token} placeholder")]
    MissingToken {
        token: &'static str,
        template: String,
    },

    /// A token appears more than once.
    #[error("Layer url '{template}' contains {token} more than once")]
    DuplicateToken {
        token: &'static str,
        template: String,
    },
}

/// A tile URL template such as `https://tile.example.org/{z}/{x}/{y}.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Wrap a template string. No validation happens here.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the template mentions the time token.
    pub fn has_time_token(&self) -> bool {
        self.0.contains(TOKEN_T)
    }

    /// Check that every required token appears exactly once.
    ///
    /// `{t}` is only required when `require_time` is set, but may never
    /// appear more than once.
    pub fn validate(&self, require_time: bool) -> Result<(), TemplateError> {
        for token in [TOKEN_Z, TOKEN_X, TOKEN_Y] {
            self.expect_once(token)?;
        }
        if require_time || self.has_time_token() {
            self.expect_once(TOKEN_T)?;
        }
        Ok(())
    }

    /// Resolve a tile without a time dimension.
    ///
    /// # Example
    ///
    /// ```
    /// use tilescape::tiling::UrlTemplate;
    ///
    /// let template = UrlTemplate::new("https://x/{z}/{x}/{y}.png");
    /// assert_eq!(template.resolve(7, 9, 4).unwrap(), "https://x/4/7/9.png");
    /// ```
    pub fn resolve(&self, x: u32, y: u32, zoom: i32) -> Result<String, TemplateError> {
        self.substitute(x, y, None, zoom)
    }

    /// Resolve a tile of a multi-time layer; `{t}` must be present.
    pub fn resolve_with_time(
        &self,
        x: u32,
        y: u32,
        t: u32,
        zoom: i32,
    ) -> Result<String, TemplateError> {
        self.substitute(x, y, Some(t), zoom)
    }

    fn substitute(
        &self,
        x: u32,
        y: u32,
        t: Option<u32>,
        zoom: i32,
    ) -> Result<String, TemplateError> {
        self.validate(t.is_some())?;

        // Tokens are replaced in the order they first appear in the template.
        let mut replacements = vec![
            (TOKEN_Z, zoom.to_string()),
            (TOKEN_X, x.to_string()),
            (TOKEN_Y, y.to_string()),
        ];
        // Single-time layers may still carry {t}; it resolves to step 0.
        if t.is_some() || self.has_time_token() {
            replacements.push((TOKEN_T, t.unwrap_or(0).to_string()));
        }
        replacements.sort_by_key(|(token, _)| self.0.find(token));

        let mut url = self.0.clone();
        for (token, value) in replacements {
            url = url.replacen(token, &value, 1);
        }
        Ok(url)
    }

    fn expect_once(&self, token: &'static str) -> Result<(), TemplateError> {
        match self.0.matches(token).count() {
            0 => Err(TemplateError::MissingToken {
                token,
                template: self.0.clone(),
            }),
            1 => Ok(()),
            _ => Err(TemplateError::DuplicateToken {
                token,
                template: self.0.clone(),
            }),
        }
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UrlTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UrlTemplate {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_resolve_standard_template() {
        let template = UrlTemplate::new("https://x/{z}/{x}/{y}.png");
        assert_eq!(template.resolve(7, 9, 4).unwrap(), "https://x/4/7/9.png");
    }

    #[test]
    fn test_resolve_out_of_order_tokens() {
        // ArcGIS style: z/y/x
        let template = UrlTemplate::new("https://tiles/{z}/{y}/{x}");
        assert_eq!(template.resolve(3, 5, 10).unwrap(), "https://tiles/10/5/3");
    }

    #[test]
    fn test_missing_token_names_token_and_template() {
        let template = UrlTemplate::new("https://x/{z}/{x}.png");
        let err = template.resolve(1, 2, 3).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingToken {
                token: TOKEN_Y,
                template: "https://x/{z}/{x}.png".to_string(),
            }
        );
        let message = err.to_string();
        assert!(message.contains("{y}"));
        assert!(message.contains("https://x/{z}/{x}.png"));
    }

    #[test]
    fn test_duplicate_token_is_rejected() {
        let template = UrlTemplate::new("https://{x}.x/{z}/{x}/{y}.png");
        assert!(matches!(
            template.resolve(1, 2, 3),
            Err(TemplateError::DuplicateToken { token: TOKEN_X, .. })
        ));
    }

    #[test]
    fn test_time_token_required_for_multi_time() {
        let template = UrlTemplate::new("https://x/{z}/{x}/{y}.png");
        assert!(matches!(
            template.resolve_with_time(1, 2, 3, 4),
            Err(TemplateError::MissingToken { token: TOKEN_T, .. })
        ));

        let timed = UrlTemplate::new("https://x/{t}/{z}/{x}/{y}.png");
        assert_eq!(
            timed.resolve_with_time(1, 2, 3, 4).unwrap(),
            "https://x/3/4/1/2.png"
        );
    }

    #[test]
    fn test_single_time_template_with_t_resolves_to_zero() {
        let timed = UrlTemplate::new("https://x/{t}/{z}/{x}/{y}.png");
        assert_eq!(timed.resolve(1, 2, 4).unwrap(), "https://x/0/4/1/2.png");
    }

    #[test]
    fn test_duplicate_time_token_rejected_without_time_dimension() {
        let template = UrlTemplate::new("https://x/{t}/{z}/{x}/{y}.png?step={t}");
        let expected = TemplateError::DuplicateToken {
            token: TOKEN_T,
            template: template.as_str().to_string(),
        };
        assert_eq!(template.resolve(1, 2, 4), Err(expected.clone()));
        assert_eq!(template.validate(false), Err(expected));
    }

    #[test]
    fn test_construction_never_fails() {
        let template = UrlTemplate::new("not a template");
        assert_eq!(template.as_str(), "not a template");
        assert!(template.validate(false).is_err());
    }

    proptest! {
        #[test]
        fn test_resolution_is_idempotent(x in 0u32..1_000_000, y in 0u32..1_000_000, z in 0i32..30) {
            let template = UrlTemplate::new("https://x/{z}/{x}/{y}.png");
            prop_assert_eq!(template.resolve(x, y, z)?, template.resolve(x, y, z)?);
        }

        #[test]
        fn test_distinct_tiles_resolve_to_distinct_urls(
            a in (0u32..5000, 0u32..5000, 0i32..25),
            b in (0u32..5000, 0u32..5000, 0i32..25),
        ) {
            prop_assume!(a != b);
            let template = UrlTemplate::new("https://x/{z}/{x}/{y}.png");
            prop_assert_ne!(template.resolve(a.0, a.1, a.2)?, template.resolve(b.0, b.1, b.2)?);
        }
    }
}
