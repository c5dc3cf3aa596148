//! rfinspect: element inspection over a headless DOM
//!
//! `rfinspect` parses an HTML document (with [`scraper`]/html5ever), resolves
//! its stylesheets into computed styles, lays it out against a viewport and
//! exposes every element through a single null-safe facade, [`Element`].
//! The facade is what accessibility checks are written against: attribute
//! and tree accessors, computed styles, bounding boxes, shadow DOM queries,
//! a unique CSS path per element and an off-screen heuristic.
//!
//! # Features
//!
//! - **fetch** (default): load pages, linked stylesheets and frame documents
//!   over HTTP with a blocking `reqwest` client
//!
//! # Example
//!
//! ```
//! use rfinspect::{Document, InspectConfig, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InspectConfig {
//!     viewport: Viewport { width: 1024, height: 768 },
//!     ..Default::default()
//! };
//! let doc = Document::parse("<main><a href='/home'>Home</a></main>", config)?;
//! let link = doc.query("a")?.expect("link present");
//! assert_eq!(link.css_selector(), "html > body > main:nth-of-type(1) > a:nth-of-type(1)");
//! assert!(!link.is_off_screen());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use serde::Serialize;

pub mod error;
pub use error::{Error, Result};

pub(crate) mod dom;
pub mod selector;
pub mod style;
pub mod rendering;

mod document;
mod element;

#[cfg(feature = "fetch")]
pub mod loader;

pub use document::{Document, ResourceFetcher};
pub use dom::{Namespace, NodeId, ShadowRootMode};
pub use element::{ChildNode, Element, NodeType};
pub use rendering::layout::DocumentMetrics;
pub use rendering::BoundingBox;
pub use style::{ComputedStyle, PseudoElement};

#[cfg(feature = "fetch")]
pub use loader::Loader;

/// Configuration used when loading and inspecting a document
///
/// The defaults match a desktop browser window: a 1280x720 viewport, 16px
/// default font size, linked stylesheets fetched when a network loader is
/// available and nested frames followed up to three levels deep.
///
/// # Examples
///
/// ```
/// let cfg = rfinspect::InspectConfig::default();
/// assert!(cfg.user_agent.contains("rfinspect"));
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct InspectConfig {
    /// User agent string sent with requests
    pub user_agent: String,
    /// Viewport dimensions used for layout and media queries
    pub viewport: Viewport,
    /// Timeout for each HTTP request in milliseconds
    pub timeout_ms: u64,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    /// Whether `<link rel="stylesheet">` targets are fetched
    pub fetch_stylesheets: bool,
    /// Whether `<iframe src>` documents are fetched
    pub load_frames: bool,
    /// Maximum nesting of frame documents (`srcdoc` included)
    pub max_frame_depth: usize,
    /// Pixel size of the `medium` font-size keyword
    pub default_font_size: f64,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) rfinspect/0.1".to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
            headers: HashMap::new(),
            fetch_stylesheets: true,
            load_frames: true,
            max_frame_depth: 3,
            default_font_size: 16.0,
        }
    }
}

impl InspectConfig {
    /// Reject configurations that cannot produce a usable layout.
    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout_ms must be greater than zero".to_string()));
        }
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            return Err(Error::ConfigError(format!(
                "default_font_size must be positive, got {}",
                self.default_font_size
            )));
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InspectConfig::default();
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 720);
        assert_eq!(config.default_font_size, 16.0);
        assert!(config.fetch_stylesheets);
    }

    #[test]
    fn test_viewport() {
        let viewport = Viewport {
            width: 1920,
            height: 1080,
        };
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = InspectConfig {
            viewport: Viewport { width: 0, height: 10 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = InspectConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = InspectConfig {
            default_font_size: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
