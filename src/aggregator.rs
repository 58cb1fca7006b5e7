use std::collections::{BTreeMap, BTreeSet};

use crate::osc::DecodedFrame;
use crate::pose::{FrameMetadata, LandmarkKey, LandmarkSample, MetaField};

/// 集約済みのフレーム状態
///
/// `latest` と `present` はフレームごとに丸ごと差し替える（前フレームの持ち越しなし）。
/// `meta_cache` と `last_known` はプロセス存続中（または reset まで）保持する。
#[derive(Debug, Clone, Default)]
pub struct FrameState {
    latest: BTreeMap<LandmarkKey, LandmarkSample>,
    present: BTreeSet<u32>,
    /// 今フレームで受信したメタデータ（num_persons は補完済み）
    frame_meta: FrameMetadata,
    /// 過去フレームを含む最新値
    last_known: FrameMetadata,
    meta_cache: BTreeMap<&'static str, String>,
}

impl FrameState {
    /// `(person_id, name)` 昇順
    pub fn landmarks(&self) -> impl Iterator<Item = &LandmarkSample> {
        self.latest.values()
    }

    pub fn get(&self, person_id: u32, name: &str) -> Option<&LandmarkSample> {
        self.latest.get(&LandmarkKey::new(person_id, name))
    }

    /// 昇順
    pub fn present(&self) -> impl Iterator<Item = u32> + '_ {
        self.present.iter().copied()
    }

    pub fn landmark_count(&self) -> usize {
        self.latest.len()
    }

    pub fn frame_meta(&self) -> &FrameMetadata {
        &self.frame_meta
    }

    pub fn last_known(&self) -> &FrameMetadata {
        &self.last_known
    }

    /// 今フレームの人数（受信値、なければ present の数）
    pub fn num_persons(&self) -> i64 {
        self.frame_meta
            .num_persons
            .unwrap_or(self.present.len() as i64)
    }

    pub fn cached_meta(&self, field: MetaField) -> Option<&str> {
        self.meta_cache.get(field.key()).map(String::as_str)
    }
}

/// `ingest` で変化したメタデータ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaChanges {
    pub fields: Vec<MetaField>,
}

impl MetaChanges {
    pub fn contains(&self, field: MetaField) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// デコード済みフレームを `FrameState` に集約する
#[derive(Debug, Default)]
pub struct PoseFrameAggregator {
    state: FrameState,
}

impl PoseFrameAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// 1フレーム分を取り込む
    ///
    /// 新しい `latest` を組み立て終えてから差し替える。
    /// 同じキーが複数行にあれば後の行が勝つ。
    pub fn ingest(&mut self, frame: DecodedFrame) -> MetaChanges {
        let mut latest = BTreeMap::new();
        for sample in frame.samples {
            latest.insert(sample.key(), sample);
        }
        let present: BTreeSet<u32> = latest.keys().map(|k| k.person_id).collect();

        let mut meta = frame.metadata;
        if meta.num_persons.is_none() {
            meta.num_persons = Some(present.len() as i64);
        }

        self.state.latest = latest;
        self.state.present = present;
        self.state.last_known.merge_from(&meta);

        let mut changes = MetaChanges::default();
        for field in MetaField::ALL {
            let Some(value) = meta.field_string(field) else {
                continue;
            };
            let cached = self.state.meta_cache.get(field.key());
            if cached.map(String::as_str) != Some(value.as_str()) {
                log::debug!("meta {} -> {}", field.key(), value);
                self.state.meta_cache.insert(field.key(), value);
                changes.fields.push(field);
            }
        }
        self.state.frame_meta = meta;
        changes
    }

    /// 状態を破棄（キャッシュも含む）
    pub fn reset(&mut self) {
        self.state = FrameState::default();
    }
}
