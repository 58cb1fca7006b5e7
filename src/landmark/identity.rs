use std::collections::HashMap;

/// ランドマークID → 名前の対応表
///
/// 外部の2列テーブル (id, name) から毎フレーム組み立て直す。
/// 空のマップも正常系で、その場合は全IDが `id_NN` にフォールバックする。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkMap {
    names: HashMap<u32, String>,
}

impl LandmarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// テーブル行からマップを構築
    ///
    /// - 先頭行のidセルが数値でなければヘッダーとして読み飛ばす
    /// - idが数値でない行、名前が空の行は黙って捨てる
    /// - 同じidが複数あれば後勝ち
    pub fn build<R, C>(table: &[R]) -> Self
    where
        R: AsRef<[C]>,
        C: AsRef<str>,
    {
        let mut names = HashMap::new();
        for (i, row) in table.iter().enumerate() {
            let row = row.as_ref();
            let (Some(id_cell), Some(name_cell)) = (row.first(), row.get(1)) else {
                continue;
            };
            let Some(id) = parse_landmark_id(id_cell.as_ref()) else {
                if i == 0 {
                    log::debug!("landmark map header skipped: {:?}", id_cell.as_ref());
                }
                continue;
            };
            let name = name_cell.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            names.insert(id, name.to_string());
        }
        Self { names }
    }

    /// IDから名前を引く。未登録なら `id_{id:02}`
    pub fn resolve(&self, id: u32) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => fallback_name(id),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// 未登録IDの決定的な代替名
pub fn fallback_name(id: u32) -> String {
    format!("id_{:02}", id)
}

/// "3" や "3.0" を受け付ける（小数部は切り捨て）
fn parse_landmark_id(cell: &str) -> Option<u32> {
    let value: f64 = cell.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value.trunc() as u32)
}
