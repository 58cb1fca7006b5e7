use anyhow::{Context, Result};
use rosc::decoder;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use crate::osc::{rows_from_packet, OscRow};

/// ポーズOSCのデフォルト受信アドレス
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9000";

/// UDPデータグラムの最大長
const RECV_BUFFER_SIZE: usize = 65_536;

/// OSC受信（バンドルは展開して1メッセージ1行にする）
pub struct OscReceiver {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl OscReceiver {
    pub fn bind(addr: &str) -> Result<Self> {
        let socket =
            UdpSocket::bind(addr).with_context(|| format!("failed to bind OSC socket {}", addr))?;
        Ok(Self {
            socket,
            buf: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// 1データグラム受信して `rows` に追加し、追加行数を返す
    ///
    /// タイムアウトとデコード不能なデータグラムは0行扱い。
    pub fn recv_into(&mut self, rows: &mut Vec<OscRow>, timeout: Duration) -> Result<usize> {
        self.socket
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;
        let len = match self.socket.recv_from(&mut self.buf) {
            Ok((len, _peer)) => len,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Ok(0)
            }
            Err(e) => return Err(e).context("OSC receive failed"),
        };
        match decoder::decode_udp(&self.buf[..len]) {
            Ok((_rest, packet)) => {
                let before = rows.len();
                rows_from_packet(&packet, rows);
                Ok(rows.len() - before)
            }
            Err(e) => {
                log::warn!("dropped undecodable OSC datagram ({} bytes): {}", len, e);
                Ok(0)
            }
        }
    }

    /// `deadline` まで受信した行をまとめて返す（1フレーム分）
    pub fn collect_until(&mut self, deadline: Instant) -> Result<Vec<OscRow>> {
        let mut rows = Vec::new();
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.recv_into(&mut rows, deadline - now)?;
        }
        Ok(rows)
    }
}

/// 受信アドレスを切り替える（失敗してもエラーにしない）
///
/// 新しいアドレスで bind できなければ現在のソケットを使い続ける。
/// 現在のソケットが同じポートを塞いでいる場合だけ、閉じてから bind し直し、
/// それも失敗したら元のアドレスに戻す。戻せなかったときは `None`。
pub fn rebind(current: Option<OscReceiver>, addr: &str) -> Option<OscReceiver> {
    let err = match OscReceiver::bind(addr) {
        Ok(receiver) => return Some(receiver),
        Err(e) => e,
    };
    let Some(current) = current else {
        log::warn!("{:#}", err);
        return None;
    };
    let previous = match current.local_addr() {
        Ok(previous) if is_addr_in_use(&err) => previous,
        _ => {
            log::warn!("{:#}, keeping current socket", err);
            return Some(current);
        }
    };
    drop(current);
    match OscReceiver::bind(addr) {
        Ok(receiver) => Some(receiver),
        Err(e) => {
            log::warn!("{:#}, restoring {}", e, previous);
            match OscReceiver::bind(&previous.to_string()) {
                Ok(receiver) => Some(receiver),
                Err(e) => {
                    log::warn!("{:#}", e);
                    None
                }
            }
        }
    }
}

fn is_addr_in_use(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|e| e.kind() == ErrorKind::AddrInUse)
        .unwrap_or(false)
}
