use anyhow::Result;
use rosc::{encoder, OscBundle, OscMessage, OscPacket, OscTime, OscType};
use std::net::UdpSocket;

use crate::emitter::Channel;
use crate::fanout::FrameOutput;

/// 転送先のデフォルトアドレス接頭辞
pub const DEFAULT_PREFIX: &str = "fanout";

/// バンドルのタイムタグ「即時」
const IMMEDIATELY: (u32, u32) = (0, 1);

/// チャンネル1本分のOSCメッセージ: `/{prefix}/{name} <double>`
///
/// エポック秒のタイムスタンプを丸めないよう f64 のまま送る
pub fn build_channel_message(prefix: &str, channel: &Channel) -> OscMessage {
    OscMessage {
        addr: format!("/{}/{}", prefix, channel.name),
        args: vec![OscType::Double(channel.value)],
    }
}

/// 1フレーム分のバンドル
/// timestamp_str は変化したときだけ `/{prefix}/timestamp_str <string>` として載せる
pub fn build_frame_bundle(prefix: &str, output: &FrameOutput) -> OscPacket {
    let mut content: Vec<OscPacket> = output
        .channels
        .iter()
        .map(|ch| OscPacket::Message(build_channel_message(prefix, ch)))
        .collect();
    if let Some(ts) = &output.timestamp_str {
        content.push(OscPacket::Message(OscMessage {
            addr: format!("/{}/timestamp_str", prefix),
            args: vec![OscType::String(ts.clone())],
        }));
    }
    OscPacket::Bundle(OscBundle {
        timetag: OscTime::from(IMMEDIATELY),
        content,
    })
}

pub fn encode_packet(packet: &OscPacket) -> Result<Vec<u8>> {
    let encoded = encoder::encode(packet)?;
    Ok(encoded)
}

/// チャンネル転送クライアント
pub struct ChannelSender {
    socket: UdpSocket,
    target_addr: String,
    prefix: String,
}

impl ChannelSender {
    pub fn new(target_addr: &str, prefix: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            target_addr: target_addr.to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        })
    }

    pub fn target_addr(&self) -> &str {
        &self.target_addr
    }

    /// 1フレーム分のチャンネルを送信
    pub fn send(&self, output: &FrameOutput) -> Result<()> {
        let packet = build_frame_bundle(&self.prefix, output);
        let data = encode_packet(&packet)?;
        self.socket.send_to(&data, &self.target_addr)?;
        Ok(())
    }
}
