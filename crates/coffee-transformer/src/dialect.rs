//! Source dialect dispatch.
//!
//! Which compiler mode and which post-processing stages a file gets is
//! decided entirely by its extension chain.

/// The four CoffeeScript source variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `.coffee` - ordinary CoffeeScript
    Plain,
    /// `.litcoffee` / `.coffee.md` - literate CoffeeScript
    Literate,
    /// `.helpers.coffee` - template helper bindings
    Helpers,
    /// `.events.coffee` - template event bindings
    Events,
}

/// The template wrapper variants, for the two dialects that get one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    Helpers,
    Events,
}

impl Dialect {
    /// Resolves the dialect from a file path.
    ///
    /// Returns `None` for anything that is not a CoffeeScript file. The
    /// wrapper dialects are checked first since their extension chains also
    /// end in `.coffee`.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".helpers.coffee") {
            return Some(Self::Helpers);
        }
        if path.ends_with(".events.coffee") {
            return Some(Self::Events);
        }
        if path.ends_with(".litcoffee") || path.ends_with(".coffee.md") {
            return Some(Self::Literate);
        }
        if path.ends_with(".coffee") {
            return Some(Self::Plain);
        }
        None
    }

    /// Whether the compiler runs in literate mode for this dialect.
    pub fn is_literate(self) -> bool {
        matches!(self, Self::Literate)
    }

    /// The template wrapper to apply, if this dialect gets one.
    pub fn wrapper(self) -> Option<WrapperKind> {
        match self {
            Self::Helpers => Some(WrapperKind::Helpers),
            Self::Events => Some(WrapperKind::Events),
            Self::Plain | Self::Literate => None,
        }
    }
}

impl WrapperKind {
    /// The property name used in the generated `Template.<name>.<kind>` path.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Helpers => "helpers",
            Self::Events => "events",
        }
    }

    /// The extension chain this wrapper dialect is keyed on.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Helpers => ".helpers.coffee",
            Self::Events => ".events.coffee",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain() {
        assert_eq!(Dialect::from_path("app.coffee"), Some(Dialect::Plain));
        assert_eq!(Dialect::from_path("lib/deep/app.coffee"), Some(Dialect::Plain));
    }

    #[test]
    fn resolves_literate() {
        assert_eq!(Dialect::from_path("notes.litcoffee"), Some(Dialect::Literate));
        assert_eq!(Dialect::from_path("notes.coffee.md"), Some(Dialect::Literate));
        assert!(Dialect::from_path("notes.litcoffee").unwrap().is_literate());
        assert!(!Dialect::from_path("app.coffee").unwrap().is_literate());
    }

    #[test]
    fn wrapper_dialects_win_over_plain() {
        assert_eq!(
            Dialect::from_path("sidebar.helpers.coffee"),
            Some(Dialect::Helpers)
        );
        assert_eq!(
            Dialect::from_path("sidebar.events.coffee"),
            Some(Dialect::Events)
        );
    }

    #[test]
    fn wrapper_kind_mapping() {
        assert_eq!(Dialect::Helpers.wrapper(), Some(WrapperKind::Helpers));
        assert_eq!(Dialect::Events.wrapper(), Some(WrapperKind::Events));
        assert_eq!(Dialect::Plain.wrapper(), None);
        assert_eq!(Dialect::Literate.wrapper(), None);
    }

    #[test]
    fn non_coffee_files_resolve_to_none() {
        assert_eq!(Dialect::from_path("app.js"), None);
        assert_eq!(Dialect::from_path("app.coffee.js"), None);
        assert_eq!(Dialect::from_path("README.md"), None);
    }
}
