//! Tests for the track device

use std::fs::File;
use std::time::Duration;

use afterglow_shared::{ClientMessage, EditorCommand, Interpolation, Key, Track, track_file};

use super::{Device, SyncCallbacks, TrackHandle};
use crate::test_utils::{FakeEditor, closed_port_addr, pump_until};

const TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Default)]
struct RecordingCallbacks {
    playing: bool,
    pauses: Vec<bool>,
    rows: Vec<u32>,
}

impl SyncCallbacks for RecordingCallbacks {
    fn pause(&mut self, paused: bool) {
        self.pauses.push(paused);
    }
    fn set_row(&mut self, row: u32) {
        self.rows.push(row);
    }
    fn is_playing(&self) -> bool {
        self.playing
    }
}

fn write_track_file(prefix: &str, track: &Track) {
    let path = track_file::track_path(prefix, track.name());
    track_file::write_track(track, File::create(path).unwrap()).unwrap();
}

fn linear(row: f64, value: f32) -> Key {
    Key::new(row, value, Interpolation::Linear)
}

fn temp_prefix() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("sync").to_str().unwrap().to_string();
    (dir, prefix)
}

#[test]
fn test_get_track_is_stable() {
    let mut device = Device::new("sync");
    let a = device.get_track("Scene");
    let b = device.get_track("Fade");
    assert_ne!(a, b);
    assert_eq!(device.get_track("Scene"), a);
    assert_eq!(device.len(), 2);
    assert_eq!(device.track(a).unwrap().name(), "Scene");
}

#[test]
fn test_new_track_is_zero() {
    let mut device = Device::new("sync");
    let handle = device.get_track("Nothing");
    assert!(device.track(handle).unwrap().is_empty());
    assert_eq!(device.value(handle, 12.0), 0.0);
}

#[test]
fn test_dummy_handle_is_zero() {
    let device = Device::new("sync");
    assert!(device.track(TrackHandle::DUMMY).is_none());
    assert_eq!(device.value(TrackHandle::DUMMY, 3.0), 0.0);
}

#[test]
fn test_load_tracks_from_files() {
    let (_dir, prefix) = temp_prefix();
    write_track_file(
        &prefix,
        &Track::from_keys("Scene", [linear(0.0, 0.0), linear(10.0, 100.0)]),
    );

    let mut device = Device::new(prefix.as_str());
    let scene = device.get_track("Scene");
    let missing = device.get_track("Missing");
    assert_eq!(device.load_tracks(), 1);
    assert!(device.is_file_backed());

    assert_eq!(device.value(scene, 5.0), 50.0);
    assert_eq!(device.value(missing, 5.0), 0.0);
}

#[test]
fn test_track_created_after_load_reads_its_file() {
    let (_dir, prefix) = temp_prefix();
    write_track_file(&prefix, &Track::from_keys("Fade", [linear(0.0, 1.0)]));

    let mut device = Device::new(prefix.as_str());
    device.load_tracks();
    let fade = device.get_track("Fade");
    assert_eq!(device.value(fade, 100.0), 1.0);
}

#[test]
fn test_corrupt_file_degrades_to_zero() {
    let (_dir, prefix) = temp_prefix();
    let path = track_file::track_path(&prefix, "Broken");
    std::fs::write(path, [5u8, 0, 0, 0, 1]).unwrap();

    let mut device = Device::new(prefix.as_str());
    let broken = device.get_track("Broken");
    assert_eq!(device.load_tracks(), 0);
    assert_eq!(device.value(broken, 0.0), 0.0);
}

#[test]
fn test_save_tracks_writes_every_track() {
    let (_dir, prefix) = temp_prefix();
    let mut device = Device::new(prefix.as_str());
    device.get_track("A");
    device.get_track("B");
    assert_eq!(device.save_tracks().unwrap(), 2);
    assert!(track_file::track_path(&prefix, "A").exists());
    assert!(track_file::track_path(&prefix, "B").exists());
}

#[test]
fn test_connect_without_editor_fails() {
    let mut device = Device::new("sync");
    assert!(!device.connect(&closed_port_addr(), TIMEOUT));
    assert!(!device.is_connected());
}

#[test]
fn test_connect_bad_address_fails() {
    let mut device = Device::new("sync");
    assert!(!device.connect("not an address", TIMEOUT));
}

#[test]
fn test_update_without_editor_reports_false() {
    let mut device = Device::new("sync");
    let mut callbacks = RecordingCallbacks::default();
    assert!(!device.update(0, &mut callbacks));
}

#[test]
fn test_update_file_backed_is_ok() {
    let (_dir, prefix) = temp_prefix();
    let mut device = Device::new(prefix.as_str());
    device.load_tracks();
    let mut callbacks = RecordingCallbacks::default();
    assert!(device.update(0, &mut callbacks));
}

#[test]
fn test_connect_requests_known_tracks() {
    let editor = FakeEditor::spawn();
    let mut device = Device::new("sync");
    device.get_track("Scene");
    device.get_track("CameraFrame");

    assert!(device.connect(&editor.addr(), TIMEOUT));
    assert!(device.is_connected());

    device.get_track("Fade");
    assert!(editor.wait_for(|msgs| msgs.len() == 3));
    assert_eq!(
        editor.received(),
        vec![
            ClientMessage::GetTrack("Scene".to_string()),
            ClientMessage::GetTrack("CameraFrame".to_string()),
            ClientMessage::GetTrack("Fade".to_string()),
        ]
    );
}

#[test]
fn test_editor_keys_are_applied() {
    let editor = FakeEditor::spawn();
    let mut device = Device::new("sync");
    let scene = device.get_track("Scene");
    assert!(device.connect(&editor.addr(), TIMEOUT));

    editor.send(EditorCommand::SetKey {
        track: 0,
        key: linear(0.0, 0.0),
    });
    editor.send(EditorCommand::SetKey {
        track: 0,
        key: linear(10.0, 100.0),
    });

    let mut callbacks = RecordingCallbacks::default();
    assert!(pump_until(
        &mut device,
        |d| {
            d.update(0, &mut callbacks);
        },
        |d| d.track(scene).unwrap().len() == 2,
    ));
    assert_eq!(device.value(scene, 2.5), 25.0);

    editor.send(EditorCommand::DeleteKey { track: 0, row: 10 });
    assert!(pump_until(
        &mut device,
        |d| {
            d.update(0, &mut callbacks);
        },
        |d| d.track(scene).unwrap().len() == 1,
    ));
}

#[test]
fn test_editor_transport_commands_reach_callbacks() {
    let editor = FakeEditor::spawn();
    let mut device = Device::new("sync");
    assert!(device.connect(&editor.addr(), TIMEOUT));

    editor.send(EditorCommand::Pause(false));
    editor.send(EditorCommand::SetRow(96));

    let mut callbacks = RecordingCallbacks::default();
    let mut done = false;
    for _ in 0..1000 {
        assert!(device.update(0, &mut callbacks));
        if callbacks.rows == [96] {
            done = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(done);
    assert_eq!(callbacks.pauses, vec![false]);
}

#[test]
fn test_row_is_reported_while_playing() {
    let editor = FakeEditor::spawn();
    let mut device = Device::new("sync");
    assert!(device.connect(&editor.addr(), TIMEOUT));

    let mut callbacks = RecordingCallbacks {
        playing: true,
        ..Default::default()
    };
    device.update(4, &mut callbacks);
    device.update(4, &mut callbacks);
    device.update(5, &mut callbacks);

    assert!(editor.wait_for(|msgs| msgs.len() == 2));
    assert_eq!(
        editor.received(),
        vec![ClientMessage::SetRow(4), ClientMessage::SetRow(5)]
    );
}

#[test]
fn test_lost_editor_reports_false() {
    let editor = FakeEditor::spawn();
    let mut device = Device::new("sync");
    assert!(device.connect(&editor.addr(), TIMEOUT));
    editor.shutdown();

    let mut callbacks = RecordingCallbacks::default();
    assert!(pump_until(
        &mut device,
        |d| {
            d.update(0, &mut callbacks);
        },
        |d| !d.is_connected(),
    ));
    assert!(!device.update(0, &mut callbacks));
}

#[test]
fn test_editor_save_command_writes_files() {
    let (_dir, prefix) = temp_prefix();
    let editor = FakeEditor::spawn();
    let mut device = Device::new(prefix.as_str());
    device.get_track("Scene");
    assert!(device.connect(&editor.addr(), TIMEOUT));

    editor.send(EditorCommand::SetKey {
        track: 0,
        key: linear(0.0, 1.0),
    });
    editor.send(EditorCommand::SetKey {
        track: 0,
        key: linear(32.0, 4.0),
    });
    editor.send(EditorCommand::SaveTracks);

    let path = track_file::track_path(&prefix, "Scene");
    let mut callbacks = RecordingCallbacks::default();
    assert!(pump_until(
        &mut device,
        |d| {
            d.update(0, &mut callbacks);
        },
        |_| path.exists(),
    ));

    let saved = track_file::read_track("Scene", File::open(&path).unwrap()).unwrap();
    assert_eq!(saved.keys(), &[linear(0.0, 1.0), linear(32.0, 4.0)]);
}

#[test]
fn test_reconnect_keeps_keys_until_resent() {
    let editor = FakeEditor::spawn();
    let addr = editor.addr();
    let mut device = Device::new("sync");
    let scene = device.get_track("Scene");
    assert!(device.connect(&addr, TIMEOUT));

    editor.send(EditorCommand::SetKey {
        track: 0,
        key: linear(0.0, 2.5),
    });
    let mut callbacks = RecordingCallbacks::default();
    assert!(pump_until(
        &mut device,
        |d| {
            d.update(0, &mut callbacks);
        },
        |d| d.track(scene).unwrap().len() == 1,
    ));

    editor.shutdown();
    assert!(pump_until(
        &mut device,
        |d| {
            d.update(0, &mut callbacks);
        },
        |d| !d.is_connected(),
    ));

    let editor = FakeEditor::spawn_at(&addr);
    assert!(device.connect(&addr, TIMEOUT));
    assert!(editor.wait_for(|msgs| msgs == [ClientMessage::GetTrack("Scene".to_string())]));
    assert_eq!(device.value(scene, 0.0), 2.5);

    // The first resent key replaces everything held from before
    editor.send(EditorCommand::SetKey {
        track: 0,
        key: linear(8.0, 6.0),
    });
    assert!(pump_until(
        &mut device,
        |d| {
            d.update(0, &mut callbacks);
        },
        |d| d.track(scene).unwrap().keys()[0].row == 8.0,
    ));
    assert_eq!(device.track(scene).unwrap().len(), 1);
    assert_eq!(device.value(scene, 0.0), 6.0);
}
