//! API variant vocabulary.
//!
//! A line reader is tested either as the single-descriptor (`mandatory`) variant or as the multi-descriptor
//! (`bonus`) variant. Each variant has its own source files and header, and the bonus variant additionally
//! compiles the interleaving checks into the verification program.

use std::fmt;

/// Stable identifier for the API variant under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Variant {
    /// One descriptor at a time, no cross-descriptor state.
    #[default]
    Single,
    /// Independent state per concurrently open descriptor.
    Multi,
}

/// Sources of the single-descriptor variant, relative to the project directory.
pub const SINGLE_SOURCES: &[&str] = &["get_next_line.c", "get_next_line_utils.c"];

/// Header of the single-descriptor variant.
pub const SINGLE_HEADER: &str = "get_next_line.h";

/// Sources of the multi-descriptor variant, relative to the project directory.
pub const MULTI_SOURCES: &[&str] = &["get_next_line_bonus.c", "get_next_line_utils_bonus.c"];

/// Header of the multi-descriptor variant.
pub const MULTI_HEADER: &str = "get_next_line_bonus.h";

impl Variant {
    /// All variants, in a stable order.
    pub const ALL: [Variant; 2] = [Variant::Single, Variant::Multi];

    /// Canonical short name (`single` / `multi`), used in artifact names and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Single => "single",
            Variant::Multi => "multi",
        }
    }

    /// Operator-facing mode name (`mandatory` / `bonus`), as accepted on the command line.
    pub fn mode_name(self) -> &'static str {
        match self {
            Variant::Single => "mandatory",
            Variant::Multi => "bonus",
        }
    }

    /// C sources compiled together with the verification program.
    pub fn sources(self) -> &'static [&'static str] {
        match self {
            Variant::Single => SINGLE_SOURCES,
            Variant::Multi => MULTI_SOURCES,
        }
    }

    /// Header the verification program includes.
    pub fn header(self) -> &'static str {
        match self {
            Variant::Single => SINGLE_HEADER,
            Variant::Multi => MULTI_HEADER,
        }
    }

    /// Every file that must exist in the project directory before this variant can be built.
    pub fn required_files(self) -> impl Iterator<Item = &'static str> {
        self.sources().iter().copied().chain(std::iter::once(self.header()))
    }

    pub fn is_multi(self) -> bool {
        self == Variant::Multi
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
