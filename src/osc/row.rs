//! Row model for unbundled OSC messages and tolerant table layout detection.
//!
//! Rows arrive either as cells of a table (address column plus argument
//! columns, optionally with a header row) or straight from a decoded OSC
//! packet. Both end up as [`OscRow`].

use rosc::{OscMessage, OscPacket, OscType};

/// OSCメッセージ1件（アドレスと文字列化した引数）
#[derive(Debug, Clone, PartialEq)]
pub struct OscRow {
    pub address: String,
    pub args: Vec<String>,
}

impl OscRow {
    pub fn new(address: impl Into<String>, args: &[&str]) -> Self {
        Self {
            address: address.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

impl From<&OscMessage> for OscRow {
    fn from(msg: &OscMessage) -> Self {
        Self {
            address: msg.addr.clone(),
            args: msg.args.iter().map(arg_to_string).collect(),
        }
    }
}

const ADDRESS_COLUMN_NAMES: [&str; 2] = ["osc address", "address"];
const ARG_COLUMN_NAMES: [&str; 2] = ["arg0", "arg1"];

/// アドレス列と最初の引数列の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub address: usize,
    pub first_arg: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            address: 0,
            first_arg: 1,
        }
    }
}

impl ColumnLayout {
    /// ヘッダー行らしければ列名から探し、なければ先頭列の位置を使う
    pub fn detect<C: AsRef<str>>(header: &[C]) -> Self {
        let defaults = Self::default();
        Self {
            address: find_column(header, &ADDRESS_COLUMN_NAMES).unwrap_or(defaults.address),
            first_arg: find_column(header, &ARG_COLUMN_NAMES).unwrap_or(defaults.first_arg),
        }
    }

    /// アドレス欄が列名になっている行（ヘッダー）か
    pub fn is_header<C: AsRef<str>>(&self, row: &[C]) -> bool {
        row.get(self.address)
            .map(|cell| {
                let cell = cell.as_ref().trim().to_lowercase();
                ADDRESS_COLUMN_NAMES.contains(&cell.as_str())
            })
            .unwrap_or(false)
    }

    /// アドレスが空の行は `None`
    pub fn extract<C: AsRef<str>>(&self, row: &[C]) -> Option<OscRow> {
        let address = row.get(self.address)?.as_ref().trim();
        if address.is_empty() {
            return None;
        }
        let args = row
            .iter()
            .skip(self.first_arg)
            .map(|cell| cell.as_ref().to_string())
            .collect();
        Some(OscRow {
            address: address.to_string(),
            args,
        })
    }
}

fn find_column<C: AsRef<str>>(header: &[C], names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        header
            .iter()
            .position(|cell| cell.as_ref().trim().eq_ignore_ascii_case(name))
    })
}

/// 表全体を行に変換（列配置を判定し、ヘッダー行は飛ばす）
pub fn rows_from_table<R, C>(table: &[R]) -> Vec<OscRow>
where
    R: AsRef<[C]>,
    C: AsRef<str>,
{
    let Some(first) = table.first() else {
        return Vec::new();
    };
    let layout = ColumnLayout::detect(first.as_ref());
    let start = if layout.is_header(first.as_ref()) { 1 } else { 0 };
    table[start..]
        .iter()
        .filter_map(|row| layout.extract(row.as_ref()))
        .collect()
}

/// パケットを到着順の行に展開（入れ子のバンドルも展開）
pub fn rows_from_packet(packet: &OscPacket, out: &mut Vec<OscRow>) {
    match packet {
        OscPacket::Message(msg) => out.push(OscRow::from(msg)),
        OscPacket::Bundle(bundle) => {
            for inner in &bundle.content {
                rows_from_packet(inner, out);
            }
        }
    }
}

fn arg_to_string(arg: &OscType) -> String {
    match arg {
        OscType::Int(v) => v.to_string(),
        OscType::Long(v) => v.to_string(),
        OscType::Float(v) => v.to_string(),
        OscType::Double(v) => v.to_string(),
        OscType::String(s) => s.clone(),
        OscType::Char(c) => c.to_string(),
        OscType::Bool(b) => String::from(if *b { "1" } else { "0" }),
        // blob, timetag, color などは数値にならない
        _ => String::new(),
    }
}
