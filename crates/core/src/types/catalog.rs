//! Catalog partitions and size codes.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level catalog partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Men,
    Women,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 2] = [Self::Men, Self::Women];

    /// Stored value (`"Men"` / `"Women"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Men => "Men",
            Self::Women => "Women",
        }
    }

    /// Lowercase URL path segment (`"men"` / `"women"`).
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
        }
    }

    /// Public catalog path for this category.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Men => "/men",
            Self::Women => "/women",
        }
    }

    /// Heading used on the catalog page, e.g. `MEN`.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Men => "MEN",
            Self::Women => "WOMEN",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Men" | "men" => Ok(Self::Men),
            "Women" | "women" => Ok(Self::Women),
            other => Err(format!("invalid category: {other}")),
        }
    }
}

/// Size code attached to a product and chosen per bag entry.
///
/// Variants are declared smallest first so the derived `Ord` is the
/// canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Size {
    XS,
    S,
    M,
    L,
}

impl Size {
    /// Every size an admin can offer.
    pub const ALL: [Self; 4] = [Self::XS, Self::S, Self::M, Self::L];

    /// Stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XS => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "XS" => Ok(Self::XS),
            "S" => Ok(Self::S),
            "M" => Ok(Self::M),
            "L" => Ok(Self::L),
            other => Err(format!("invalid size code: {other}")),
        }
    }
}

/// Error for an empty [`SizeSet`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("select at least one size")]
pub struct SizeSetError;

/// Non-empty, de-duplicated set of sizes in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Size>", into = "Vec<Size>")]
pub struct SizeSet(Vec<Size>);

impl SizeSet {
    /// Build a set from any collection of sizes.
    ///
    /// # Errors
    ///
    /// Returns [`SizeSetError`] if no size is given.
    pub fn new(sizes: impl IntoIterator<Item = Size>) -> Result<Self, SizeSetError> {
        let mut sizes: Vec<Size> = sizes.into_iter().collect();
        sizes.sort_unstable();
        sizes.dedup();
        if sizes.is_empty() {
            return Err(SizeSetError);
        }
        Ok(Self(sizes))
    }

    /// Parse a comma-separated list such as `"S,M"`.
    ///
    /// Unknown codes are skipped; the result still has to be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`SizeSetError`] if no valid size remains.
    pub fn parse_csv(input: &str) -> Result<Self, SizeSetError> {
        Self::new(input.split(',').filter_map(|s| s.parse().ok()))
    }

    /// Whether `size` is offered.
    #[must_use]
    pub fn contains(&self, size: Size) -> bool {
        self.0.contains(&size)
    }

    /// Sizes in canonical order.
    #[must_use]
    pub fn as_slice(&self) -> &[Size] {
        &self.0
    }

    /// Iterate in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Size> + '_ {
        self.0.iter().copied()
    }

    /// Comma-separated codes, the inverse of [`SizeSet::parse_csv`].
    #[must_use]
    pub fn to_csv(&self) -> String {
        self.join(",")
    }

    /// Codes joined with `sep`.
    #[must_use]
    pub fn join(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl TryFrom<Vec<Size>> for SizeSet {
    type Error = SizeSetError;

    fn try_from(sizes: Vec<Size>) -> Result<Self, Self::Error> {
        Self::new(sizes)
    }
}

impl From<SizeSet> for Vec<Size> {
    fn from(set: SizeSet) -> Self {
        set.0
    }
}
