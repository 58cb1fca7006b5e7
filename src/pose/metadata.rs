/// 低頻度メタデータの各フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaField {
    FrameCount,
    NumPersons,
    ImageWidth,
    ImageHeight,
    Timestamp,
    TimestampStr,
}

impl MetaField {
    pub const ALL: [MetaField; 6] = [
        Self::FrameCount,
        Self::NumPersons,
        Self::ImageWidth,
        Self::ImageHeight,
        Self::Timestamp,
        Self::TimestampStr,
    ];

    /// 変更検知キャッシュのキー
    pub fn key(self) -> &'static str {
        match self {
            Self::FrameCount => "frame_count",
            Self::NumPersons => "num_persons",
            Self::ImageWidth => "image_width",
            Self::ImageHeight => "image_height",
            Self::Timestamp => "timestamp",
            Self::TimestampStr => "timestamp_str",
        }
    }
}

/// フレームのメタデータ（部分更新）
///
/// そのフレームで受信したアドレスのフィールドだけが `Some`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMetadata {
    pub frame_count: Option<i64>,
    pub num_persons: Option<i64>,
    pub image_width: Option<i64>,
    pub image_height: Option<i64>,
    pub timestamp_seconds: Option<f64>,
    pub timestamp_string: Option<String>,
}

impl FrameMetadata {
    /// フィールド値を文字列化（未受信なら `None`）
    pub fn field_string(&self, field: MetaField) -> Option<String> {
        match field {
            MetaField::FrameCount => self.frame_count.map(|v| v.to_string()),
            MetaField::NumPersons => self.num_persons.map(|v| v.to_string()),
            MetaField::ImageWidth => self.image_width.map(|v| v.to_string()),
            MetaField::ImageHeight => self.image_height.map(|v| v.to_string()),
            MetaField::Timestamp => self.timestamp_seconds.map(|v| v.to_string()),
            MetaField::TimestampStr => self.timestamp_string.clone(),
        }
    }

    /// `other` に値があるフィールドだけ上書き
    pub fn merge_from(&mut self, other: &FrameMetadata) {
        if other.frame_count.is_some() {
            self.frame_count = other.frame_count;
        }
        if other.num_persons.is_some() {
            self.num_persons = other.num_persons;
        }
        if other.image_width.is_some() {
            self.image_width = other.image_width;
        }
        if other.image_height.is_some() {
            self.image_height = other.image_height;
        }
        if other.timestamp_seconds.is_some() {
            self.timestamp_seconds = other.timestamp_seconds;
        }
        if other.timestamp_string.is_some() {
            self.timestamp_string = other.timestamp_string.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_string() {
        let meta = FrameMetadata {
            image_width: Some(1280),
            timestamp_seconds: Some(1.5),
            ..Default::default()
        };
        assert_eq!(meta.field_string(MetaField::ImageWidth).as_deref(), Some("1280"));
        assert_eq!(meta.field_string(MetaField::Timestamp).as_deref(), Some("1.5"));
        assert_eq!(meta.field_string(MetaField::ImageHeight), None);
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let mut cached = FrameMetadata {
            image_width: Some(640),
            image_height: Some(480),
            ..Default::default()
        };
        let update = FrameMetadata {
            image_width: Some(1280),
            frame_count: Some(7),
            ..Default::default()
        };
        cached.merge_from(&update);
        assert_eq!(cached.image_width, Some(1280));
        assert_eq!(cached.image_height, Some(480));
        assert_eq!(cached.frame_count, Some(7));
    }

    #[test]
    fn test_keys_are_distinct() {
        let mut keys: Vec<_> = MetaField::ALL.iter().map(|f| f.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), MetaField::ALL.len());
    }
}
