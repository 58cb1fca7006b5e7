//! Flattens a [`FrameState`] into the named channel list consumed downstream.
//!
//! Channel order: landmark `_x/_y/_z` by `(person_id, name)`, then
//! `p{pid}_present`, then `pose_*`. Optional metadata channels are omitted
//! entirely when unknown.

use serde::Deserialize;

use crate::aggregator::FrameState;
use crate::landmark::LandmarkMask;
use crate::pose::FrameMetadata;

pub const CH_N_PEOPLE: &str = "pose_n_people";
pub const CH_FRAME_COUNT: &str = "pose_frame_count";
pub const CH_IMG_W: &str = "pose_img_w";
pub const CH_IMG_H: &str = "pose_img_h";
pub const CH_TS_SEC: &str = "pose_ts_sec";
pub const CH_TS_MS: &str = "pose_ts_ms";

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub value: f64,
}

impl Channel {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// 任意メタデータのチャンネル値をどこから取るか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPolicy {
    /// 今フレームで受信した項目だけ
    #[default]
    Frame,
    /// 最後に受信した値
    Cached,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelEmitter {
    pub policy: MetadataPolicy,
    pub mask: LandmarkMask,
}

impl ChannelEmitter {
    pub fn new(policy: MetadataPolicy, mask: LandmarkMask) -> Self {
        Self { policy, mask }
    }

    /// `state` を読むだけ（同じ状態なら同じ出力）
    pub fn emit(&self, state: &FrameState) -> Vec<Channel> {
        let mut out = Vec::with_capacity(state.landmark_count() * 3 + 8);

        for sample in state.landmarks() {
            if !self.mask.allows(&sample.name) {
                continue;
            }
            let base = format!("p{}_{}", sample.person_id, sample.name);
            out.push(Channel::new(format!("{}_x", base), sample.x));
            out.push(Channel::new(format!("{}_y", base), sample.y));
            out.push(Channel::new(format!("{}_z", base), sample.z));
        }

        for pid in state.present() {
            out.push(Channel::new(format!("p{}_present", pid), 1.0));
        }

        out.push(Channel::new(CH_N_PEOPLE, state.num_persons() as f64));

        let meta: &FrameMetadata = match self.policy {
            MetadataPolicy::Frame => state.frame_meta(),
            MetadataPolicy::Cached => state.last_known(),
        };
        if let Some(v) = meta.frame_count {
            out.push(Channel::new(CH_FRAME_COUNT, v as f64));
        }
        if let Some(v) = meta.image_width {
            out.push(Channel::new(CH_IMG_W, v as f64));
        }
        if let Some(v) = meta.image_height {
            out.push(Channel::new(CH_IMG_H, v as f64));
        }
        if let Some(ts) = meta.timestamp_seconds {
            out.push(Channel::new(CH_TS_SEC, ts));
            out.push(Channel::new(CH_TS_MS, ts * 1000.0));
        }
        out
    }
}
