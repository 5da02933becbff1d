//! Core shared types for Weft.
//!
//! This crate is intentionally small: it holds the value types that every other
//! Weft crate passes around (class names, source spans, diagnostics).

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Internal name of `java.lang.Object`.
pub const OBJECT_INTERNAL_NAME: &str = "java/lang/Object";

/// A JVM class name in internal form (`java/lang/String`).
///
/// Binary names (`java.lang.String`) are accepted by [`ClassName::new`] and
/// normalized; the stored form always uses `/` separators.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(SmolStr);

impl ClassName {
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name.contains('.') {
            Self(SmolStr::new(name.replace('.', "/")))
        } else {
            Self(SmolStr::new(name))
        }
    }

    /// Parse a class from a field descriptor such as `Ljava/lang/String;`.
    pub fn from_descriptor(desc: &str) -> Option<Self> {
        let inner = desc.strip_prefix('L')?.strip_suffix(';')?;
        if inner.is_empty() || inner.contains(';') {
            return None;
        }
        Some(Self::new(inner))
    }

    pub fn object() -> Self {
        Self(SmolStr::new_inline(OBJECT_INTERNAL_NAME))
    }

    pub fn is_object(&self) -> bool {
        self.0 == OBJECT_INTERNAL_NAME
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Ljava/lang/String;` for `java/lang/String`.
    pub fn descriptor(&self) -> String {
        format!("L{};", self.0)
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassName({})", self.0)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A byte-span into a source string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity}[{}]: {}", self.code, self.message)
    }
}
