use std::time::Duration;

use crate::tree::NodeId;

/// How leaf buttons in the top bar map pointer halves to zones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BarLeafZones {
    /// Left half drops before, right half drops after.
    #[default]
    Natural,

    /// Left half drops after, right half drops before.
    ///
    /// Only for hosts whose bar indicator is drawn on the side opposite to the drop.
    Inverted,
}

/// Options for [`super::ReorderEngine`].
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct ReorderOptions {
    /// How long the suspension signal stays raised after a drag ends, so that dependent
    /// auto-hide timers see a settled state before the panel may close.
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub suspension_grace: Duration,

    /// Root container id for top-level nodes of the bookmarks bar.
    pub bar_root_id: NodeId,

    /// Root container id for top-level nodes of the "other bookmarks" region.
    pub other_root_id: NodeId,

    /// If true, dropping a folder inside itself or any of its descendants is rejected when
    /// resolving the destination instead of being sent to the bookmark store.
    pub reject_descendant_drops: bool,

    /// Zone mapping for leaf buttons on the bar.
    pub bar_leaf_zones: BarLeafZones,

    /// Upper bound (exclusive) of the `Before` zone on three-zone targets.
    pub three_zone_before: f32,

    /// Lower bound (inclusive) of the `After` zone on three-zone targets.
    pub three_zone_after: f32,

    /// If true, record engine events in a small ring buffer (see `debug_log_text`).
    pub debug_event_log: bool,

    /// Maximum number of debug log lines to keep.
    pub debug_event_log_capacity: usize,
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self {
            suspension_grace: Duration::from_millis(300),
            bar_root_id: NodeId::new("1"),
            other_root_id: NodeId::new("2"),
            reject_descendant_drops: true,
            bar_leaf_zones: BarLeafZones::Natural,
            three_zone_before: 0.33,
            three_zone_after: 0.67,
            debug_event_log: false,
            debug_event_log_capacity: 200,
        }
    }
}

impl ReorderOptions {
    /// Thresholds with `before <= after`, both inside `[0, 1]`.
    pub(crate) fn three_zone_thresholds(&self) -> (f32, f32) {
        let sanitize = |v: f32, fallback: f32| {
            if v.is_finite() {
                v.clamp(0.0, 1.0)
            } else {
                fallback
            }
        };
        let before = sanitize(self.three_zone_before, 0.33);
        let after = sanitize(self.three_zone_after, 0.67);
        (before.min(after), before.max(after))
    }
}

#[cfg(feature = "serde")]
mod duration_millis {
    use std::time::Duration;

    pub(super) fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let ms = <u64 as serde::Deserialize>::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
