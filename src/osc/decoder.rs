//! Decodes one frame's OSC rows into landmark samples and a metadata update.
//!
//! Decoding is best-effort: a malformed row is dropped and counted, never
//! fatal. Exact metadata addresses are matched before the landmark pattern.

use std::sync::LazyLock;

use regex::Regex;

use crate::landmark::table::unquote;
use crate::landmark::LandmarkMap;
use crate::osc::row::OscRow;
use crate::pose::{FrameMetadata, LandmarkSample};

pub const ADDR_FRAME_COUNT: &str = "/pose/frame_count";
pub const ADDR_NUM_PERSONS: &str = "/pose/num_persons";
pub const ADDR_IMAGE_WIDTH: &str = "/pose/image_width";
pub const ADDR_IMAGE_HEIGHT: &str = "/pose/image_height";
pub const ADDR_TIMESTAMP: &str = "/pose/timestamp";
pub const ADDR_TIMESTAMP_STR: &str = "/pose/timestamp_str";

/// `/pose/p{pid}/{lid|name}` または短縮形 `/p{pid}/{lid|name}`
static LANDMARK_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?:pose/)?p(?P<pid>[0-9]+)/(?P<landmark>[A-Za-z0-9_]+)$")
        .expect("invalid landmark address regex")
});

/// 1フレーム分のデコード結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFrame {
    /// 行順のランドマーク（重複はそのまま、集約側で後勝ち）
    pub samples: Vec<LandmarkSample>,
    pub metadata: FrameMetadata,
    /// アドレスは既知だが引数が使えなかった行数
    pub malformed: usize,
    /// 未知のアドレスの行数
    pub ignored: usize,
}

enum RowKind {
    Landmark(LandmarkSample),
    Meta,
    Malformed,
    Ignored,
}

pub struct FrameDecoder<'a> {
    map: &'a LandmarkMap,
}

impl<'a> FrameDecoder<'a> {
    pub fn new(map: &'a LandmarkMap) -> Self {
        Self { map }
    }

    pub fn decode(&self, rows: &[OscRow]) -> DecodedFrame {
        let mut frame = DecodedFrame::default();
        for row in rows {
            match self.decode_row(row, &mut frame.metadata) {
                RowKind::Landmark(sample) => frame.samples.push(sample),
                RowKind::Meta => {}
                RowKind::Malformed => {
                    log::trace!("malformed row dropped: {} {:?}", row.address, row.args);
                    frame.malformed += 1;
                }
                RowKind::Ignored => frame.ignored += 1,
            }
        }
        frame
    }

    fn decode_row(&self, row: &OscRow, meta: &mut FrameMetadata) -> RowKind {
        let address = row.address.as_str();
        match address {
            ADDR_FRAME_COUNT => set_meta(&mut meta.frame_count, parse_int(row.arg(0))),
            ADDR_NUM_PERSONS => set_meta(&mut meta.num_persons, parse_int(row.arg(0))),
            ADDR_IMAGE_WIDTH => set_meta(&mut meta.image_width, parse_int(row.arg(0))),
            ADDR_IMAGE_HEIGHT => set_meta(&mut meta.image_height, parse_int(row.arg(0))),
            ADDR_TIMESTAMP => set_meta(&mut meta.timestamp_seconds, parse_float(row.arg(0))),
            ADDR_TIMESTAMP_STR => {
                let text = row.arg(0).map(unquote).filter(|s| !s.is_empty());
                set_meta(&mut meta.timestamp_string, text.map(str::to_string))
            }
            _ => self.decode_landmark(row),
        }
    }

    fn decode_landmark(&self, row: &OscRow) -> RowKind {
        let Some(caps) = LANDMARK_ADDR.captures(&row.address) else {
            return RowKind::Ignored;
        };
        let Ok(person_id) = caps["pid"].parse::<u32>() else {
            return RowKind::Malformed;
        };
        let landmark = &caps["landmark"];
        let name = if landmark.bytes().all(|b| b.is_ascii_digit()) {
            match landmark.parse::<u32>() {
                Ok(id) => self.map.resolve(id),
                Err(_) => return RowKind::Malformed,
            }
        } else {
            landmark.to_string()
        };

        let (Some(x), Some(y), Some(z)) = (
            parse_float(row.arg(0)),
            parse_float(row.arg(1)),
            parse_float(row.arg(2)),
        ) else {
            return RowKind::Malformed;
        };
        RowKind::Landmark(LandmarkSample::new(person_id, name, x, y, z))
    }
}

/// 後の行が勝つ。使えない値なら前の値を残す
fn set_meta<T>(slot: &mut Option<T>, value: Option<T>) -> RowKind {
    match value {
        Some(v) => {
            *slot = Some(v);
            RowKind::Meta
        }
        None => RowKind::Malformed,
    }
}

fn parse_float(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse().ok()
}

/// 整数は "1280" でも "1280.0" でも受け付ける
fn parse_int(cell: Option<&str>) -> Option<i64> {
    let value = parse_float(cell)?;
    if !value.is_finite() || value.abs() > i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> LandmarkMap {
        LandmarkMap::build(&[
            vec!["id".to_string(), "name".to_string()],
            vec!["0".to_string(), "nose".to_string()],
            vec!["1".to_string(), "eye_l".to_string()],
        ])
    }

    fn decode(rows: &[OscRow]) -> DecodedFrame {
        let map = map();
        FrameDecoder::new(&map).decode(rows)
    }

    #[test]
    fn test_numeric_landmark_resolved() {
        let frame = decode(&[OscRow::new("/pose/p2/1", &["0.1", "0.2", "0.3"])]);
        assert_eq!(frame.samples, vec![LandmarkSample::new(2, "eye_l", 0.1, 0.2, 0.3)]);
    }

    #[test]
    fn test_unmapped_landmark_fallback() {
        let frame = decode(&[OscRow::new("/pose/p0/7", &["1", "2", "3"])]);
        assert_eq!(frame.samples[0].name, "id_07");
    }

    #[test]
    fn test_named_and_short_forms() {
        let frame = decode(&[
            OscRow::new("/pose/p1/wrist_l", &["0.5", "0.6", "0.7"]),
            OscRow::new("/p3/0", &["0.1", "0.1", "0.1"]),
            OscRow::new("/p4/hand_tip", &["0.2", "0.2", "0.2"]),
        ]);
        assert_eq!(frame.samples.len(), 3);
        assert_eq!(frame.samples[0].name, "wrist_l");
        assert_eq!(frame.samples[1].person_id, 3);
        assert_eq!(frame.samples[1].name, "nose");
        assert_eq!(frame.samples[2].name, "hand_tip");
    }

    #[test]
    fn test_metadata_fields() {
        let frame = decode(&[
            OscRow::new(ADDR_FRAME_COUNT, &["42"]),
            OscRow::new(ADDR_NUM_PERSONS, &["2.0"]),
            OscRow::new(ADDR_IMAGE_WIDTH, &["1280"]),
            OscRow::new(ADDR_IMAGE_HEIGHT, &["720"]),
            OscRow::new(ADDR_TIMESTAMP, &["1700000000.25"]),
            OscRow::new(ADDR_TIMESTAMP_STR, &["\"2024.01.02.03.04.05.678\""]),
        ]);
        let meta = &frame.metadata;
        assert_eq!(meta.frame_count, Some(42));
        assert_eq!(meta.num_persons, Some(2));
        assert_eq!(meta.image_width, Some(1280));
        assert_eq!(meta.image_height, Some(720));
        assert_eq!(meta.timestamp_seconds, Some(1700000000.25));
        assert_eq!(meta.timestamp_string.as_deref(), Some("2024.01.02.03.04.05.678"));
        assert!(frame.samples.is_empty());
    }

    #[test]
    fn test_too_few_args_dropped() {
        let frame = decode(&[
            OscRow::new("/pose/p1/0", &["0.1", "0.2"]),
            OscRow::new("/pose/p1/1", &["0.1", "0.2", "0.3"]),
        ]);
        assert_eq!(frame.samples.len(), 1);
        assert_eq!(frame.malformed, 1);
    }

    #[test]
    fn test_non_numeric_arg_dropped() {
        let frame = decode(&[
            OscRow::new("/pose/p1/0", &["0.1", "abc", "0.3"]),
            OscRow::new("/pose/p1/1", &["0.4", "0.5", "0.6"]),
        ]);
        assert_eq!(frame.samples, vec![LandmarkSample::new(1, "eye_l", 0.4, 0.5, 0.6)]);
        assert_eq!(frame.malformed, 1);
    }

    #[test]
    fn test_extra_args_ignored() {
        let frame = decode(&[OscRow::new("/pose/p1/0", &["0.1", "0.2", "0.3", "0.9"])]);
        assert_eq!(frame.samples[0].position(), [0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_unknown_addresses_ignored() {
        let frame = decode(&[
            OscRow::new("/pose/legacy", &["1"]),
            OscRow::new("/pose/p1", &["1", "2", "3"]),
            OscRow::new("/pose/px/0", &["1", "2", "3"]),
            OscRow::new("/pose/p1/left-wrist", &["1", "2", "3"]),
            OscRow::new("/show/fader", &["0.5"]),
        ]);
        assert!(frame.samples.is_empty());
        assert_eq!(frame.ignored, 5);
    }

    #[test]
    fn test_bad_metadata_keeps_earlier_value() {
        let frame = decode(&[
            OscRow::new(ADDR_IMAGE_WIDTH, &["640"]),
            OscRow::new(ADDR_IMAGE_WIDTH, &["wide"]),
            OscRow::new(ADDR_FRAME_COUNT, &[]),
        ]);
        assert_eq!(frame.metadata.image_width, Some(640));
        assert_eq!(frame.metadata.frame_count, None);
        assert_eq!(frame.malformed, 2);
    }

    #[test]
    fn test_metadata_last_row_wins() {
        let frame = decode(&[
            OscRow::new(ADDR_FRAME_COUNT, &["1"]),
            OscRow::new(ADDR_FRAME_COUNT, &["2"]),
        ]);
        assert_eq!(frame.metadata.frame_count, Some(2));
    }

    #[test]
    fn test_person_id_overflow_is_malformed() {
        let frame = decode(&[OscRow::new("/pose/p99999999999/0", &["1", "2", "3"])]);
        assert!(frame.samples.is_empty());
        assert_eq!(frame.malformed, 1);
    }

    #[test]
    fn test_empty_timestamp_str_not_recorded() {
        let frame = decode(&[OscRow::new(ADDR_TIMESTAMP_STR, &["\"\""])]);
        assert_eq!(frame.metadata.timestamp_string, None);
    }
}
