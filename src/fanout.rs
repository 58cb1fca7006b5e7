//! One decode → aggregate → emit cycle per tick.

use crate::aggregator::{FrameState, MetaChanges, PoseFrameAggregator};
use crate::config::Config;
use crate::emitter::{Channel, ChannelEmitter, MetadataPolicy};
use crate::landmark::{read_table_or_empty, LandmarkMap, LandmarkMask};
use crate::osc::{rows_from_table, FrameDecoder, OscRow};
use crate::pose::MetaField;

/// 1サイクルの出力
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    pub channels: Vec<Channel>,
    pub changes: MetaChanges,
    /// 受信して、かつ前回から変わったときだけ `Some`
    pub timestamp_str: Option<String>,
    pub malformed: usize,
    pub ignored: usize,
}

/// 設定から導出される適用状態
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    landmark_table: Vec<Vec<String>>,
    mask: LandmarkMask,
    policy: MetadataPolicy,
    log_frames: bool,
}

impl Settings {
    fn from_config(config: &Config) -> Self {
        let landmark_table = match read_table_or_empty(&config.landmarks.map_path) {
            Ok(table) => table,
            Err(e) => {
                log::warn!("{:#}, landmark names fall back to ids", e);
                Vec::new()
            }
        };
        Self {
            landmark_table,
            mask: LandmarkMask::resolve(
                &config.landmarks.mask,
                config.landmarks.mask_path.as_deref(),
            ),
            policy: config.output.metadata_policy,
            log_frames: config.output.log_frames,
        }
    }
}

/// ポーズOSCのファンアウト処理
///
/// ランドマーク表はサイクルごとにマップへ組み直す。
pub struct PoseFanout {
    landmark_table: Vec<Vec<String>>,
    emitter: ChannelEmitter,
    aggregator: PoseFrameAggregator,
    log_frames: bool,
}

impl PoseFanout {
    pub fn new(landmark_table: Vec<Vec<String>>) -> Self {
        Self {
            landmark_table,
            emitter: ChannelEmitter::default(),
            aggregator: PoseFrameAggregator::new(),
            log_frames: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut fanout = Self::new(Vec::new());
        fanout.reconcile(config);
        fanout
    }

    /// 設定を適用する。何度呼んでも同じ結果になり、変化があれば true
    pub fn reconcile(&mut self, config: &Config) -> bool {
        let desired = Settings::from_config(config);
        let current = Settings {
            landmark_table: std::mem::take(&mut self.landmark_table),
            mask: std::mem::take(&mut self.emitter.mask),
            policy: self.emitter.policy,
            log_frames: self.log_frames,
        };
        let changed = desired != current;
        if changed {
            let mask = if desired.mask.is_pass_through() {
                "all".to_string()
            } else {
                format!("{} names", desired.mask.len())
            };
            log::info!(
                "config applied: {} map rows, mask {}, policy {:?}",
                desired.landmark_table.len(),
                mask,
                desired.policy,
            );
        }
        self.landmark_table = desired.landmark_table;
        self.emitter = ChannelEmitter::new(desired.policy, desired.mask);
        self.log_frames = desired.log_frames;
        changed
    }

    pub fn set_landmark_table(&mut self, table: Vec<Vec<String>>) {
        self.landmark_table = table;
    }

    pub fn set_policy(&mut self, policy: MetadataPolicy) {
        self.emitter.policy = policy;
    }

    pub fn state(&self) -> &FrameState {
        self.aggregator.state()
    }

    /// 1フレーム分の行を処理してチャンネルを返す
    pub fn cycle(&mut self, rows: &[OscRow]) -> FrameOutput {
        if self.log_frames {
            log_rows(rows);
        }
        let map = LandmarkMap::build(&self.landmark_table);
        let frame = FrameDecoder::new(&map).decode(rows);
        let (malformed, ignored) = (frame.malformed, frame.ignored);

        let changes = self.aggregator.ingest(frame);
        let timestamp_str = if changes.contains(MetaField::TimestampStr) {
            self.state().frame_meta().timestamp_string.clone()
        } else {
            None
        };

        FrameOutput {
            channels: self.emitter.emit(self.state()),
            changes,
            timestamp_str,
            malformed,
            ignored,
        }
    }

    /// テーブル形式（ヘッダー行・列配置は自動判定）の行を処理
    pub fn cycle_table<R, C>(&mut self, table: &[R]) -> FrameOutput
    where
        R: AsRef<[C]>,
        C: AsRef<str>,
    {
        let rows = rows_from_table(table);
        self.cycle(&rows)
    }

    /// 直近の状態からチャンネルを再生成（状態は変えない）
    pub fn channels(&self) -> Vec<Channel> {
        self.emitter.emit(self.state())
    }

    pub fn reset(&mut self) {
        self.aggregator.reset();
    }
}

fn log_rows(rows: &[OscRow]) {
    log::debug!("--- pose frame ({} rows) ---", rows.len());
    for row in rows {
        log::debug!("{}  {}", row.address, row.args.join(" "));
    }
}
