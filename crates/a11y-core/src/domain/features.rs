//! Feature bitset selecting the active chain links.
//!
//! Each bit enables exactly one link. The numeric values are stable because
//! the bitset is exchanged with the settings layer of the broader service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One switchable pipeline feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Magnification,
    TouchExploration,
    KeyFiltering,
    GestureInjection,
    DwellClick,
    MouseKeys,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Magnification,
        Feature::TouchExploration,
        Feature::KeyFiltering,
        Feature::GestureInjection,
        Feature::DwellClick,
        Feature::MouseKeys,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            Feature::Magnification => FeatureFlags::MAGNIFICATION,
            Feature::TouchExploration => FeatureFlags::TOUCH_EXPLORATION,
            Feature::KeyFiltering => FeatureFlags::KEY_FILTERING,
            Feature::GestureInjection => FeatureFlags::GESTURE_INJECTION,
            Feature::DwellClick => FeatureFlags::DWELL_CLICK,
            Feature::MouseKeys => FeatureFlags::MOUSE_KEYS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Feature::Magnification => "magnification",
            Feature::TouchExploration => "touch-exploration",
            Feature::KeyFiltering => "key-filtering",
            Feature::GestureInjection => "gesture-injection",
            Feature::DwellClick => "dwell-click",
            Feature::MouseKeys => "mouse-keys",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature name: {0:?}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == s.trim())
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/// Bitset of enabled [`Feature`]s.
///
/// ```rust
/// use a11y_core::{Feature, FeatureFlags};
///
/// let flags: FeatureFlags = [Feature::TouchExploration, Feature::Magnification]
///     .into_iter()
///     .collect();
/// assert_eq!(flags.0, 0x3);
/// assert!(flags.contains(Feature::Magnification));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlags(pub u32);

impl FeatureFlags {
    pub const MAGNIFICATION: u32 = 0x01;
    pub const TOUCH_EXPLORATION: u32 = 0x02;
    pub const KEY_FILTERING: u32 = 0x04;
    pub const GESTURE_INJECTION: u32 = 0x08;
    pub const DWELL_CLICK: u32 = 0x10;
    pub const MOUSE_KEYS: u32 = 0x40;

    pub const NONE: FeatureFlags = FeatureFlags(0);

    pub fn contains(&self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub fn insert(&mut self, feature: Feature) {
        self.0 |= feature.bit();
    }

    pub fn remove(&mut self, feature: Feature) {
        self.0 &= !feature.bit();
    }

    /// `true` when no known feature bit is set. Unknown bits are ignored.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Enabled features in ascending bit order.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.contains(*f))
    }

    /// Parses a comma-separated list such as `"magnification,dwell-click"`.
    pub fn parse_list(list: &str) -> Result<Self, UnknownFeature> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Feature::from_str)
            .collect()
    }
}

impl FromIterator<Feature> for FeatureFlags {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut flags = FeatureFlags::NONE;
        for f in iter {
            flags.insert(f);
        }
        flags
    }
}

impl fmt::Display for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Feature::name).collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(","))
        }
    }
}
