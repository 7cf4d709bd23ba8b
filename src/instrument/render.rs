//! Result rendering for the success path.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::InstrumentError;
use super::inspect::{simple_type_name, Inspect};

/// How return values are rendered in the result record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// No result record at all.
    #[default]
    Suppressed,
    /// Type name only, or `null`.
    #[serde(alias = "type_tag_only")]
    TypeTag,
    /// Literal for strings and scalars, type name otherwise.
    Literal,
    /// Pretty-printed structured form, type name on failure.
    Serialized,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suppressed => "suppressed",
            Self::TypeTag => "type_tag",
            Self::Literal => "literal",
            Self::Serialized => "serialized",
        }
    }

    /// True if a result record is produced in this mode.
    pub fn logs_result(&self) -> bool {
        !matches!(self, Self::Suppressed)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown render mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown render mode: {0}")]
pub struct ParseRenderModeError(pub String);

impl FromStr for RenderMode {
    type Err = ParseRenderModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suppressed" | "none" | "off" => Ok(Self::Suppressed),
            "type_tag" | "type_tag_only" | "type" => Ok(Self::TypeTag),
            "literal" => Ok(Self::Literal),
            "serialized" | "json" => Ok(Self::Serialized),
            other => Err(ParseRenderModeError(other.to_string())),
        }
    }
}

/// A rendered result plus the reason it was degraded, if it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub degraded: Option<InstrumentError>,
}

impl Rendered {
    fn exact(text: String) -> Self {
        Self {
            text,
            degraded: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Converts a return value into its logged form.
pub struct ResultRenderer;

impl ResultRenderer {
    /// Render `value` in `mode`. Returns `None` only for [`RenderMode::Suppressed`].
    ///
    /// Never fails and never panics: serialization errors and panics inside
    /// `Inspect` implementations fall back to the type tag.
    pub fn render<T: Inspect + ?Sized>(value: &T, mode: RenderMode) -> Option<Rendered> {
        if !mode.logs_result() {
            return None;
        }

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| render_unguarded(value, mode)));
        match attempt {
            Ok(rendered) => Some(rendered),
            Err(_) => {
                let type_tag = simple_type_name(std::any::type_name::<T>());
                Some(Rendered {
                    degraded: Some(InstrumentError::ResultSerialization {
                        type_tag: type_tag.clone(),
                        reason: "panicked while rendering".to_string(),
                    }),
                    text: type_tag,
                })
            }
        }
    }
}

fn render_unguarded<T: Inspect + ?Sized>(value: &T, mode: RenderMode) -> Rendered {
    match mode {
        RenderMode::Suppressed | RenderMode::TypeTag => Rendered::exact(type_tag_or_null(value)),
        RenderMode::Literal => Rendered::exact(literal_or_type_tag(value)),
        RenderMode::Serialized => match value.structured() {
            Ok(text) => Rendered::exact(text),
            Err(err) => Rendered {
                text: type_tag_or_null(value),
                degraded: Some(err),
            },
        },
    }
}

fn type_tag_or_null<T: Inspect + ?Sized>(value: &T) -> String {
    if value.is_null() {
        "null".to_string()
    } else {
        value.type_tag()
    }
}

fn literal_or_type_tag<T: Inspect + ?Sized>(value: &T) -> String {
    if value.is_null() {
        return "null".to_string();
    }
    value.literal().unwrap_or_else(|| value.type_tag())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cyclic;
    impl Inspect for Cyclic {}

    struct Exploding;
    impl Inspect for Exploding {
        fn structured(&self) -> Result<String, InstrumentError> {
            panic!("serializer blew up");
        }
    }

    #[test]
    fn test_suppressed_renders_nothing() {
        assert!(ResultRenderer::render(&42, RenderMode::Suppressed).is_none());
    }

    #[test]
    fn test_type_tag_mode() {
        let r = ResultRenderer::render(&"hello".to_string(), RenderMode::TypeTag).unwrap();
        assert_eq!(r.text, "String");
        let none: Option<u32> = None;
        let r = ResultRenderer::render(&none, RenderMode::TypeTag).unwrap();
        assert_eq!(r.text, "null");
    }

    #[test]
    fn test_literal_mode() {
        let r = ResultRenderer::render(&"hello".to_string(), RenderMode::Literal).unwrap();
        assert_eq!(r.text, "hello");
        let r = ResultRenderer::render(&Cyclic, RenderMode::Literal).unwrap();
        assert_eq!(r.text, "Cyclic");
        assert!(!r.is_degraded());
    }

    #[test]
    fn test_serialized_mode() {
        let r = ResultRenderer::render(&vec!["a", "b"], RenderMode::Serialized).unwrap();
        assert_eq!(r.text, "[\n  \"a\",\n  \"b\"\n]");
        assert!(!r.is_degraded());
    }

    #[test]
    fn test_serialized_falls_back_to_type_tag() {
        let r = ResultRenderer::render(&Cyclic, RenderMode::Serialized).unwrap();
        assert_eq!(r.text, "Cyclic");
        assert!(r.degraded.as_ref().is_some_and(InstrumentError::is_fail_soft));
    }

    #[test]
    fn test_panicking_serializer_degrades() {
        let r = ResultRenderer::render(&Exploding, RenderMode::Serialized).unwrap();
        assert_eq!(r.text, "Exploding");
        assert!(r.is_degraded());
    }

    #[test]
    fn test_render_mode_parsing() {
        assert_eq!("serialized".parse::<RenderMode>().unwrap(), RenderMode::Serialized);
        assert_eq!("TYPE_TAG_ONLY".parse::<RenderMode>().unwrap(), RenderMode::TypeTag);
        assert_eq!(" literal ".parse::<RenderMode>().unwrap(), RenderMode::Literal);
        assert!("verbose".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::default(), RenderMode::Suppressed);
    }
}
