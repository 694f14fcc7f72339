//! Rendering layers
//!
//! Layers are coarse z-order bands. The stack never places a window of a
//! higher layer below one of a lower layer, and occlusion is resolved
//! independently inside each band.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Window layer types for Z-ordering, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Root = 0,
    Low = 1,
    World = 2,
    Main = 3,
    PopWindowLow = 4,
    PopWindow = 5,
    PopWindowTop = 6,
    Guide = 7,
    Dialog = 8,
    Tips = 9,
    PopTips = 10,
    Loading = 11,
    Sys = 12,
    Modal = 13,
    Top = 14,
}

impl Layer {
    /// Every layer in ascending z-order
    pub const ALL: [Layer; 15] = [
        Layer::Root,
        Layer::Low,
        Layer::World,
        Layer::Main,
        Layer::PopWindowLow,
        Layer::PopWindow,
        Layer::PopWindowTop,
        Layer::Guide,
        Layer::Dialog,
        Layer::Tips,
        Layer::PopTips,
        Layer::Loading,
        Layer::Sys,
        Layer::Modal,
        Layer::Top,
    ];

    /// Numeric z value used by the stack's insertion pass
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Layer::Root => "root",
            Layer::Low => "low",
            Layer::World => "world",
            Layer::Main => "main",
            Layer::PopWindowLow => "pop-window-low",
            Layer::PopWindow => "pop-window",
            Layer::PopWindowTop => "pop-window-top",
            Layer::Guide => "guide",
            Layer::Dialog => "dialog",
            Layer::Tips => "tips",
            Layer::PopTips => "pop-tips",
            Layer::Loading => "loading",
            Layer::Sys => "sys",
            Layer::Modal => "modal",
            Layer::Top => "top",
        }
    }

    /// One of the three popup priority bands
    pub fn is_popup(self) -> bool {
        matches!(
            self,
            Layer::PopWindowLow | Layer::PopWindow | Layer::PopWindowTop
        )
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::PopWindow
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|layer| layer.name() == normalized)
            .ok_or_else(|| format!("unknown layer '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_are_totally_ordered() {
        for pair in Layer::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].value() + 1, pair[1].value());
        }
        assert!(Layer::Main < Layer::PopWindow);
        assert!(Layer::Modal < Layer::Top);
    }

    #[test]
    fn test_value_roundtrip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_value(layer.value()), Some(layer));
        }
        assert_eq!(Layer::from_value(15), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("pop-window".parse::<Layer>(), Ok(Layer::PopWindow));
        assert_eq!("POP_WINDOW_TOP".parse::<Layer>(), Ok(Layer::PopWindowTop));
        assert_eq!("main".parse::<Layer>(), Ok(Layer::Main));
        assert!("nowhere".parse::<Layer>().is_err());
    }

    #[test]
    fn test_popup_bands() {
        assert!(Layer::PopWindowLow.is_popup());
        assert!(Layer::PopWindowTop.is_popup());
        assert!(!Layer::Dialog.is_popup());
    }
}
