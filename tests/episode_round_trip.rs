use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use gaitlog::episode::logger::{EpisodeLogger, Sample};
use gaitlog::episode::store::{Format, StoreError};

fn unique_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "gaitlog_episode_test_{}_{}",
        name,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    fs::create_dir_all(&p).unwrap();
    p
}

fn sample_logger() -> EpisodeLogger {
    let mut log = EpisodeLogger::new(0.005);
    for i in 0..20 {
        let t = i as f64 * 0.005;
        log.record_state("dof_pos", (t * 3.0).sin());
        log.record_state("dof_pos_target", 0.5);
        log.record_state("dof_vel", (t * 3.0).cos());
        log.record_state("dof_torque", 8.0 * (t * 3.0).cos());
        log.record_state("base_vel_x", 0.8);
        log.record_state("command_x", 1.0);
        log.record_state("contact_forces_z", vec![40.0 + i as f64, 38.0]);
    }
    let mut rewards = HashMap::new();
    rewards.insert("rew_tracking".to_string(), 0.75);
    log.record_rewards(&rewards, 2);
    log
}

fn assert_logs_equal(a: &EpisodeLogger, b: &EpisodeLogger) {
    assert_eq!(a.dt, b.dt);
    assert_eq!(a.num_episodes, b.num_episodes);
    assert_eq!(a.state_log, b.state_log);
    assert_eq!(a.rew_log, b.rew_log);
}

#[test]
fn json_round_trip() {
    let dir = unique_dir("json");
    let log = sample_logger();
    let path = log.save("run", Format::Json, &dir).unwrap();
    assert!(path.ends_with("run.json"));

    let mut restored = EpisodeLogger::new(0.0);
    restored.load(&path).unwrap();
    assert_logs_equal(&log, &restored);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn bincode_round_trip() {
    let dir = unique_dir("bin");
    let log = sample_logger();
    let path = log.save("run", Format::Bin, &dir).unwrap();
    assert!(path.ends_with("run.bin"));

    let mut restored = EpisodeLogger::new(0.0);
    restored.load(&path).unwrap();
    assert_logs_equal(&log, &restored);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn load_replaces_existing_content() {
    let dir = unique_dir("replace");
    let saved = sample_logger();
    let path = saved.save("run", Format::Json, &dir).unwrap();

    let mut other = EpisodeLogger::new(0.5);
    other.record_state("stale_series", 123.0);
    other.num_episodes = 99;
    other.load(&path).unwrap();

    assert!(!other.state_log.contains_key("stale_series"));
    assert_logs_equal(&saved, &other);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn load_rejects_unknown_suffix() {
    let dir = unique_dir("suffix");
    let path = dir.join("run.pkl");
    fs::write(&path, b"not a log").unwrap();

    let mut log = EpisodeLogger::new(0.0);
    let err = log.load(&path).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedFormat(ext) if ext == "pkl"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn render_async_writes_the_figure() {
    let dir = unique_dir("figure");
    let log = sample_logger();
    let path = dir.join("episode.png");

    log.render_async(&path).join().unwrap();
    assert!(path.exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn render_async_snapshot_ignores_later_writes() {
    let dir = unique_dir("snapshot");
    let mut log = sample_logger();
    let path = dir.join("episode.png");

    let handle = log.render_async(&path);
    // Mutating while the task runs is allowed; the task sees the snapshot.
    log.record_state("dof_pos", 42.0);
    log.reset();
    handle.join().unwrap();
    assert!(path.exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn restored_sample_kinds_survive() {
    let dir = unique_dir("kinds");
    let log = sample_logger();
    let path = log.save("run", Format::Json, &dir).unwrap();

    let mut restored = EpisodeLogger::new(0.0);
    restored.load(&path).unwrap();
    assert!(matches!(
        restored.state_log["dof_pos"][0],
        Sample::Scalar(_)
    ));
    assert!(matches!(
        restored.state_log["contact_forces_z"][0],
        Sample::Vector(_)
    ));

    let _ = fs::remove_dir_all(&dir);
}
