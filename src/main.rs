use anyhow::Result;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use pose_fanout::config::Config;
use pose_fanout::fanout::PoseFanout;
use pose_fanout::receiver::{rebind, OscReceiver};
use pose_fanout::sender::ChannelSender;

const CONFIG_PATH: &str = "pose_fanout.toml";

fn modified(path: &str) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn make_sender(config: &Config) -> Result<Option<ChannelSender>> {
    match &config.osc.forward_addr {
        Some(addr) => Ok(Some(ChannelSender::new(addr, &config.osc.forward_prefix)?)),
        None => Ok(None),
    }
}

fn write_timestamp_str(path: &Path, text: &str) {
    if let Err(e) = fs::write(path, text) {
        log::warn!("failed to write {}: {}", path.display(), e);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let mut config = Config::load_or_default(&config_path);
    let mut config_mtime = modified(&config_path);

    println!("Pose Fanout");
    println!("Config: {}", config_path);
    println!("Listen: {}", config.osc.listen_addr);
    println!("Forward: {}", config.osc.forward_addr.as_deref().unwrap_or("(none)"));
    println!("Landmark map: {}", config.landmarks.map_path.display());
    println!("Target FPS: {}", config.app.target_fps);
    println!();

    let mut receiver = Some(OscReceiver::bind(&config.osc.listen_addr)?);
    let mut sender = make_sender(&config)?;
    let mut fanout = PoseFanout::from_config(&config);

    let mut frame_duration = Duration::from_secs_f64(1.0 / config.app.target_fps.max(1) as f64);

    // 1秒ごとの統計
    let mut frame_count = 0u32;
    let mut row_count = 0usize;
    let mut dropped_count = 0usize;
    let mut stats_timer = Instant::now();

    loop {
        let deadline = Instant::now() + frame_duration;
        let rows = match receiver.as_mut() {
            Some(r) => r.collect_until(deadline)?,
            None => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                Vec::new()
            }
        };
        let output = fanout.cycle(&rows);

        if let Some(ref s) = sender {
            if let Err(e) = s.send(&output) {
                log::warn!("forward to {} failed: {:#}", s.target_addr(), e);
            }
        }
        if let (Some(ts), Some(path)) = (&output.timestamp_str, &config.output.timestamp_str_path) {
            write_timestamp_str(path, ts);
        }

        frame_count += 1;
        row_count += rows.len();
        dropped_count += output.malformed;

        let elapsed = stats_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let people: Vec<String> = fanout.state().present().map(|p| p.to_string()).collect();
            println!(
                "FPS: {:.1} | rows {} | dropped {} | people {} [{}]",
                frame_count as f32 / elapsed,
                row_count,
                dropped_count,
                fanout.state().num_persons(),
                people.join(","),
            );
            frame_count = 0;
            row_count = 0;
            dropped_count = 0;
            stats_timer = Instant::now();

            if receiver.is_none() {
                receiver = rebind(None, &config.osc.listen_addr);
            }

            // 設定ファイルの再読み込み
            let mtime = modified(&config_path);
            if mtime != config_mtime {
                config_mtime = mtime;
                let new_config = Config::reload(&config_path, &config);
                if new_config.osc.listen_addr != config.osc.listen_addr {
                    receiver = rebind(receiver.take(), &new_config.osc.listen_addr);
                    if let Some(addr) = receiver.as_ref().and_then(|r| r.local_addr().ok()) {
                        log::info!("listening on {}", addr);
                    }
                }
                if new_config.osc != config.osc {
                    match make_sender(&new_config) {
                        Ok(new_sender) => sender = new_sender,
                        Err(e) => log::warn!("{:#}, keeping current forward target", e),
                    }
                }
                if fanout.reconcile(&new_config) {
                    println!("Config reloaded");
                }
                frame_duration =
                    Duration::from_secs_f64(1.0 / new_config.app.target_fps.max(1) as f64);
                config = new_config;
            }
        }
    }
}
