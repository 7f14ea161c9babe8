//! Goop colors and rank-gated palettes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GoopColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    White,
    Black,
}

impl GoopColor {
    pub const ALL: [Self; 7] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::White,
        Self::Black,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            Self::Red => "#ef4444",
            Self::Blue => "#3b82f6",
            Self::Green => "#22c55e",
            Self::Yellow => "#eab308",
            Self::Purple => "#a855f7",
            Self::White => "#f8fafc",
            Self::Black => "#1e1b4b",
        }
    }

    /// Packed 0xRRGGBBAA, fully opaque
    pub fn rgba(self) -> u32 {
        let hex = &self.hex()[1..];
        let rgb = u32::from_str_radix(hex, 16).unwrap_or(0xffffff);
        (rgb << 8) | 0xff
    }
}

/// Rank at which Purple joins the palette
pub const PURPLE_RANK: u32 = 10;
/// Rank at which pieces may carry two colors
pub const MULTI_COLOR_RANK: u32 = 20;
/// Rank at which White joins the palette
pub const WHITE_RANK: u32 = 30;
/// Rank at which Black joins the palette
pub const BLACK_RANK: u32 = 50;

/// Colors available at `rank`; each threshold only ever adds
pub fn get_palette_for_rank(rank: u32) -> Vec<GoopColor> {
    let mut palette = vec![
        GoopColor::Red,
        GoopColor::Blue,
        GoopColor::Green,
        GoopColor::Yellow,
    ];
    if rank >= PURPLE_RANK {
        palette.push(GoopColor::Purple);
    }
    if rank >= WHITE_RANK {
        palette.push(GoopColor::White);
    }
    if rank >= BLACK_RANK {
        palette.push(GoopColor::Black);
    }
    palette
}

pub fn multi_color_unlocked(rank: u32) -> bool {
    rank >= MULTI_COLOR_RANK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_palette() {
        for rank in [0, 1, 9] {
            let p = get_palette_for_rank(rank);
            assert_eq!(p.len(), 4);
            assert!(p.contains(&GoopColor::Red));
            assert!(p.contains(&GoopColor::Yellow));
        }
    }

    #[test]
    fn test_thresholds() {
        assert!(get_palette_for_rank(10).contains(&GoopColor::Purple));
        assert_eq!(get_palette_for_rank(10).len(), 5);
        assert_eq!(get_palette_for_rank(20).len(), 5);
        assert!(multi_color_unlocked(20));
        assert!(!multi_color_unlocked(19));
        assert!(get_palette_for_rank(30).contains(&GoopColor::White));
        assert_eq!(get_palette_for_rank(30).len(), 6);
        assert_eq!(get_palette_for_rank(50).len(), 7);
        assert_eq!(get_palette_for_rank(100), GoopColor::ALL.to_vec());
    }

    #[test]
    fn test_palette_is_monotonic() {
        for rank in 0..100 {
            let now = get_palette_for_rank(rank);
            let next = get_palette_for_rank(rank + 1);
            assert!(now.iter().all(|c| next.contains(c)));
        }
    }

    #[test]
    fn test_rgba_packing() {
        assert_eq!(GoopColor::Red.rgba(), 0xef4444ff);
    }
}
