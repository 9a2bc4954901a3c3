use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualified name for class identity.
///
/// Used as the primary key of the class registry. Names are written the way
/// the source language writes them (`pkg.Outer.Inner`) and spelled for the
/// target language with [`QualifiedName::cpp_name`].
///
/// # Examples
///
/// ```
/// use serbridge_core::QualifiedName;
///
/// let list = QualifiedName::from_dotted("java.util.List");
/// assert_eq!(list.simple_name(), "List");
/// assert_eq!(list.to_string(), "java.util.List");
/// assert_eq!(list.cpp_name(), "java::util::List");
///
/// let int = QualifiedName::global("int");
/// assert!(int.is_global());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct QualifiedName {
    /// Simple name (e.g., "List", "Entry")
    pub name: String,
    /// Enclosing path (package segments followed by enclosing classes).
    /// Empty for the default package.
    pub path: Vec<String>,
}

impl QualifiedName {
    /// Create a new qualified name with an enclosing path.
    pub fn new(name: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }

    /// Create a qualified name in the default package.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Vec::new(),
        }
    }

    /// Create from a dotted string (e.g., "java.util.Map.Entry").
    ///
    /// Splits on "." - the last segment is the name, the rest is the path.
    /// Empty segments are dropped, so "java..util.List" == "java.util.List".
    pub fn from_dotted(s: &str) -> Self {
        let mut parts: Vec<String> = s
            .split('.')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        match parts.pop() {
            Some(name) => Self { name, path: parts },
            None => Self::global(""),
        }
    }

    /// Check if this is in the default package.
    pub fn is_global(&self) -> bool {
        self.path.is_empty()
    }

    /// Get the simple (unqualified) name.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Get the enclosing path.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Spell this name for the target language.
    ///
    /// Path separators become `::`, and binary nested-class names
    /// (`Outer$Inner`) are split the same way.
    pub fn cpp_name(&self) -> String {
        self.path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .flat_map(|segment| segment.split('$'))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Create a child name nested inside this one.
    ///
    /// Example: `java.util.Map` + `Entry` = `java.util.Map.Entry`
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(self.name.clone());
        Self {
            name: name.into(),
            path,
        }
    }

    /// Get the enclosing name (if any).
    ///
    /// Example: `java.util.Map.Entry` -> Some(`java.util.Map`)
    pub fn parent(&self) -> Option<Self> {
        let (name, path) = self.path.split_last()?;
        Some(Self {
            name: name.clone(),
            path: path.to_vec(),
        })
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.path.join("."), self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_dotted(s)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from_dotted(&s)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}
