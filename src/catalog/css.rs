//! Stylesheet URLs for the upstream CSS2 endpoint.

use thiserror::Error;
use url::form_urlencoded;

pub const CSS2_BASE_URL: &str = "https://fonts.googleapis.com/css2";

pub const DEFAULT_WEIGHTS: &str = "400";
pub const DEFAULT_DISPLAY: &str = "swap";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssUrlError {
    #[error("family is required")]
    MissingFamily,
}

/// Builds `css2?family=<family>:<axis>&display=<display>`.
///
/// `weights` is a CSV whose entries are trimmed and whose blanks are dropped;
/// if nothing is left, `400` is used. `italic == "1"` selects the
/// `ital,wght@1,<w>;1,<w>` axis, any other value the upright `wght@<w>;<w>`.
///
/// # Examples
///
/// ```
/// use fontdeck::catalog::build_css2_url;
///
/// let url = build_css2_url("Open Sans", Some("400,700"), None, None).unwrap();
/// assert_eq!(
///     url,
///     "https://fonts.googleapis.com/css2?family=Open+Sans:wght@400;700&display=swap"
/// );
/// ```
pub fn build_css2_url(
    family: &str,
    weights: Option<&str>,
    italic: Option<&str>,
    display: Option<&str>,
) -> Result<String, CssUrlError> {
    let family = family.trim();
    if family.is_empty() {
        return Err(CssUrlError::MissingFamily);
    }

    let mut weights: Vec<&str> = weights
        .unwrap_or(DEFAULT_WEIGHTS)
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect();
    if weights.is_empty() {
        weights.push(DEFAULT_WEIGHTS);
    }

    let axis = if italic.map(str::trim) == Some("1") {
        let tuples: Vec<String> = weights.iter().map(|w| format!("1,{w}")).collect();
        format!("ital,wght@{}", tuples.join(";"))
    } else {
        format!("wght@{}", weights.join(";"))
    };

    let display = display
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DISPLAY);

    // Only the family is escaped; `display` is passed through as given.
    let family: String = form_urlencoded::byte_serialize(family.as_bytes()).collect();

    Ok(format!(
        "{CSS2_BASE_URL}?family={family}:{axis}&display={display}"
    ))
}
