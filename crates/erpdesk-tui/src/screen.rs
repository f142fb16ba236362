//! Screen identifiers: one list screen per catalog resource.

use std::fmt;

use erpdesk_core::Resource;
use erpdesk_core::catalog;

/// Navigable by number keys 1-8, in tab-bar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Applicants,
    FinishedGoods,
    RawMaterials,
    Colours,
    Descriptions,
    MrfProducts,
    Vendors,
    Companies,
}

impl ScreenId {
    pub const ALL: [ScreenId; 8] = [
        Self::Applicants,
        Self::FinishedGoods,
        Self::RawMaterials,
        Self::Colours,
        Self::Descriptions,
        Self::MrfProducts,
        Self::Vendors,
        Self::Companies,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    /// Numeric key (1-8) for this screen.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Screen showing the resource with catalog key `key`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.resource().key == key)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn resource(self) -> &'static Resource {
        match self {
            Self::Applicants => &catalog::APPLICANTS,
            Self::FinishedGoods => &catalog::FINISHED_GOODS,
            Self::RawMaterials => &catalog::RAW_MATERIALS,
            Self::Colours => &catalog::COLOURS_LIST,
            Self::Descriptions => &catalog::DESCRIPTIONS,
            Self::MrfProducts => &catalog::MRF_PRODUCTS,
            Self::Vendors => &catalog::VENDORS,
            Self::Companies => &catalog::COMPANIES,
        }
    }

    /// Short label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Applicants => "Applicants",
            Self::FinishedGoods => "Finished",
            Self::RawMaterials => "Raw",
            Self::Colours => "Colours",
            Self::Descriptions => "Descr",
            Self::MrfProducts => "MRF",
            Self::Vendors => "Vendors",
            Self::Companies => "Companies",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_resource_has_a_screen() {
        for resource in catalog::ALL {
            let id = ScreenId::from_key(resource.key);
            assert!(id.is_some(), "no screen for {}", resource.key);
        }
    }

    #[test]
    fn number_keys_round_trip_and_wrap() {
        for id in ScreenId::ALL {
            assert_eq!(ScreenId::from_number(id.number()), Some(id));
        }
        assert_eq!(ScreenId::from_number(0), None);
        assert_eq!(ScreenId::from_number(9), None);
        assert_eq!(ScreenId::Companies.next(), ScreenId::Applicants);
        assert_eq!(ScreenId::Applicants.prev(), ScreenId::Companies);
    }
}
