/// 人物ID + ランドマーク名。`(person_id, name)` の昇順で並ぶ
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LandmarkKey {
    pub person_id: u32,
    pub name: String,
}

impl LandmarkKey {
    pub fn new(person_id: u32, name: impl Into<String>) -> Self {
        Self {
            person_id,
            name: name.into(),
        }
    }
}

/// 1人・1ランドマークの座標
///
/// zは奥行き（信頼度ではない）
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSample {
    pub person_id: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkSample {
    pub fn new(person_id: u32, name: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            person_id,
            name: name.into(),
            x,
            y,
            z,
        }
    }

    pub fn key(&self) -> LandmarkKey {
        LandmarkKey::new(self.person_id, self.name.clone())
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering() {
        let mut keys = vec![
            LandmarkKey::new(2, "nose"),
            LandmarkKey::new(1, "wrist_l"),
            LandmarkKey::new(1, "ankle_r"),
            LandmarkKey::new(10, "eye_l"),
        ];
        keys.sort();
        assert_eq!(keys[0], LandmarkKey::new(1, "ankle_r"));
        assert_eq!(keys[1], LandmarkKey::new(1, "wrist_l"));
        assert_eq!(keys[2], LandmarkKey::new(2, "nose"));
        // 人物IDは数値順
        assert_eq!(keys[3], LandmarkKey::new(10, "eye_l"));
    }

    #[test]
    fn test_sample_key() {
        let s = LandmarkSample::new(3, "nose", 0.1, 0.2, 0.3);
        assert_eq!(s.key(), LandmarkKey::new(3, "nose"));
        assert_eq!(s.position(), [0.1, 0.2, 0.3]);
    }
}
