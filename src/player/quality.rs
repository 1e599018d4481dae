//! Quality tiers and the player's format filter expressions

use crate::extractor::models::Variant;
use std::fmt;
use std::str::FromStr;

/// Named quality bucket, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Q2k,
    Q1080p60,
    Q1080p,
    Q720p60,
    Q720p,
    Q360p,
    Q240p,
    Q144p,
}

impl QualityTier {
    /// Fixed enumeration order; the first available tier is the best one
    pub const ALL: [QualityTier; 8] = [
        QualityTier::Q2k,
        QualityTier::Q1080p60,
        QualityTier::Q1080p,
        QualityTier::Q720p60,
        QualityTier::Q720p,
        QualityTier::Q360p,
        QualityTier::Q240p,
        QualityTier::Q144p,
    ];

    /// Tier reported when no variant qualifies for any tier
    pub const FALLBACK: QualityTier = QualityTier::Q360p;

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Q2k => "2k",
            QualityTier::Q1080p60 => "1080p60",
            QualityTier::Q1080p => "1080p",
            QualityTier::Q720p60 => "720p60",
            QualityTier::Q720p => "720p",
            QualityTier::Q360p => "360p",
            QualityTier::Q240p => "240p",
            QualityTier::Q144p => "144p",
        }
    }

    /// Membership predicate over (height, fps)
    pub fn admits(self, height: u32, fps: u32) -> bool {
        match self {
            QualityTier::Q2k => height >= 1440,
            QualityTier::Q1080p60 => height >= 1080 && fps >= 60,
            QualityTier::Q1080p => height >= 1080,
            QualityTier::Q720p60 => height >= 720 && fps >= 60,
            QualityTier::Q720p => (720..1080).contains(&height),
            QualityTier::Q360p => (360..720).contains(&height),
            QualityTier::Q240p => (240..360).contains(&height),
            QualityTier::Q144p => (144..240).contains(&height),
        }
    }

    /// Video stream constraint in yt-dlp format-filter syntax
    fn video_constraint(self) -> &'static str {
        match self {
            QualityTier::Q2k => "[height>=1440]",
            QualityTier::Q1080p60 => "[height>=1080][fps>=60]",
            QualityTier::Q1080p => "[height>=1080]",
            QualityTier::Q720p60 => "[height>=720][fps>=60]",
            QualityTier::Q720p => "[height>=720][height<1080]",
            QualityTier::Q360p => "[height>=360][height<720]",
            QualityTier::Q240p => "[height>=240][height<360]",
            QualityTier::Q144p => "[height>=144][height<240]",
        }
    }

    /// Best video matching the tier plus best audio, else best combined
    pub fn format_filter(self) -> String {
        format!("bestvideo{}+bestaudio/best", self.video_constraint())
    }
}

/// Format filter for a tier label; unknown labels get the unconstrained filter
pub fn format_filter_for(label: &str) -> String {
    label
        .parse::<QualityTier>()
        .map(QualityTier::format_filter)
        .unwrap_or_else(|_| "best".to_string())
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityTier::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown quality tier: {}", s))
    }
}

/// Tiers satisfied by at least one variant, in enumeration order.
///
/// Each tier is checked independently against the whole set, so different
/// tiers may be backed by different variants. Falls back to `[360p]` when
/// nothing qualifies.
pub fn available_tiers(variants: &[Variant]) -> Vec<QualityTier> {
    let tiers: Vec<QualityTier> = QualityTier::ALL
        .into_iter()
        .filter(|tier| variants.iter().any(|v| tier.admits(v.height, v.fps)))
        .collect();

    if tiers.is_empty() {
        vec![QualityTier::FALLBACK]
    } else {
        tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn variant(height: u32, fps: u32) -> Variant {
        Variant {
            height,
            fps,
            has_audio: true,
            has_video: true,
            url: String::new(),
        }
    }

    fn labels(tiers: &[QualityTier]) -> Vec<&'static str> {
        tiers.iter().map(|t| t.label()).collect()
    }

    #[test]
    fn test_empty_falls_back_to_360p() {
        assert_eq!(labels(&available_tiers(&[])), vec!["360p"]);
    }

    #[test]
    fn test_unknown_dimensions_fall_back() {
        assert_eq!(labels(&available_tiers(&[variant(0, 0), variant(100, 30)])), vec!["360p"]);
    }

    #[test]
    fn test_1080p30_and_720p60() {
        let tiers = available_tiers(&[variant(1080, 30), variant(720, 60)]);
        // 1080p60 needs h and fps on the same variant; the 720/60 variant
        // satisfies both 720p60 and 720p
        assert_eq!(labels(&tiers), vec!["1080p", "720p60", "720p"]);
    }

    #[test]
    fn test_1080p60_also_admits_lower_high_fps_tiers() {
        let tiers = available_tiers(&[variant(1080, 60)]);
        assert_eq!(labels(&tiers), vec!["1080p60", "1080p", "720p60"]);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(labels(&available_tiers(&[variant(1440, 30)])), vec!["2k", "1080p"]);
        assert_eq!(labels(&available_tiers(&[variant(719, 30)])), vec!["360p"]);
        assert_eq!(labels(&available_tiers(&[variant(359, 30)])), vec!["240p"]);
        assert_eq!(labels(&available_tiers(&[variant(144, 30)])), vec!["144p"]);
        assert_eq!(labels(&available_tiers(&[variant(143, 30)])), vec!["360p"]);
    }

    #[test]
    fn test_format_filters() {
        assert_eq!(
            QualityTier::Q1080p60.format_filter(),
            "bestvideo[height>=1080][fps>=60]+bestaudio/best"
        );
        assert_eq!(
            QualityTier::Q720p.format_filter(),
            "bestvideo[height>=720][height<1080]+bestaudio/best"
        );
        assert_eq!(format_filter_for("2k"), "bestvideo[height>=1440]+bestaudio/best");
        assert_eq!(format_filter_for("4k"), "best");
    }

    #[test]
    fn test_label_round_trip() {
        for tier in QualityTier::ALL {
            assert_eq!(tier.label().parse::<QualityTier>(), Ok(tier));
        }
        assert!("8k".parse::<QualityTier>().is_err());
    }

    proptest! {
        #[test]
        fn prop_tiers_are_ordered_and_backed(
            dims in prop::collection::vec((0u32..2500, 0u32..121), 0..12)
        ) {
            let variants: Vec<Variant> = dims.iter().map(|&(h, f)| variant(h, f)).collect();
            let tiers = available_tiers(&variants);
            prop_assert!(!tiers.is_empty());

            let positions: Vec<usize> = tiers
                .iter()
                .map(|t| QualityTier::ALL.iter().position(|a| a == t).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

            let backed = tiers
                .iter()
                .all(|t| variants.iter().any(|v| t.admits(v.height, v.fps)));
            let fallback = tiers == vec![QualityTier::FALLBACK]
                && !QualityTier::ALL
                    .iter()
                    .any(|t| variants.iter().any(|v| t.admits(v.height, v.fps)));
            prop_assert!(backed || fallback);
        }
    }
}
