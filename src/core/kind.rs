//! Bundle kinds.

use std::fmt;

/// The two kinds of bundle the pipeline knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    Styles,
    Scripts,
}

impl BundleKind {
    pub const ALL: [Self; 2] = [Self::Styles, Self::Scripts];

    /// Task and log name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Styles => "styles",
            Self::Scripts => "scripts",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
