use std::collections::BTreeSet;
use std::path::Path;

use super::table::read_table;

/// 出力するランドマークの絞り込み
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LandmarkMask {
    /// 全ランドマークを通す
    #[default]
    All,
    /// 名前が含まれるランドマークのみ通す
    Only(BTreeSet<String>),
}

impl LandmarkMask {
    /// マスクCSVの行から作成
    ///
    /// 1列目が名前。先頭セルが `key` / `name` ならヘッダー扱い。
    pub fn from_rows<R, C>(rows: &[R]) -> Self
    where
        R: AsRef<[C]>,
        C: AsRef<str>,
    {
        let mut names = BTreeSet::new();
        for (i, row) in rows.iter().enumerate() {
            let Some(cell) = row.as_ref().first() else {
                continue;
            };
            let name = cell.as_ref().trim();
            if i == 0 && matches!(name.to_lowercase().as_str(), "key" | "name") {
                continue;
            }
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
        Self::Only(names)
    }

    /// 設定のマスク名とCSVパスから解決
    ///
    /// 名前が空か `all` なら素通し。ファイルが読めなければ警告して素通しに戻す。
    pub fn resolve(mask_name: &str, csv_path: Option<&Path>) -> Self {
        let key = mask_name.trim().to_lowercase();
        if key.is_empty() || key == "all" {
            return Self::All;
        }
        let Some(path) = csv_path else {
            log::warn!("mask '{}' has no csv, falling back to pass-through", key);
            return Self::All;
        };
        match read_table(path) {
            Ok(rows) => {
                let mask = Self::from_rows(&rows);
                log::info!("loaded mask '{}' with {} landmarks", key, mask.len());
                mask
            }
            Err(e) => {
                log::warn!("{:#}, falling back to pass-through", e);
                Self::All
            }
        }
    }

    pub fn allows(&self, landmark_name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(landmark_name),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::All)
    }

    /// 絞り込み対象の数（素通しなら0）
    pub fn len(&self) -> usize {
        match self {
            Self::All => 0,
            Self::Only(names) => names.len(),
        }
    }
}
