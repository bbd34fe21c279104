//! Integration tests for `gardimage camera`
//!
//! - Directory, basic info and packed command payloads
//! - Register scripts transcoded in place
//! - Named and numeric command identifiers

mod common;

use common::{
    entries_at, run_gardimage, u32_at, TestProject, SAMPLE_CAMERA_MANIFEST, SAMPLE_SCRIPT,
};

const SCRIPT_BLOB: [u8; 20] = [
    2, 0, 0, 0, 2, 0xAA, 0xBB, 0xCC, 0xDD, 0xFF, 0xFF, 0xFF, 0xFF, 0x04, 5, 0, 0, 0, 1, 2,
];

#[test]
fn test_camera_from_manifest() {
    let project = TestProject::new();
    project.create_file("camera.toml", SAMPLE_CAMERA_MANIFEST);
    project.create_file("start.txt", SAMPLE_SCRIPT);
    project.create_binary("stop.bin", &[7, 7, 7]);

    let output = run_gardimage(&project, &["camera", "--manifest", "camera.toml"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let bytes = project.read_binary("camera.bin");
    let entries = entries_at(&bytes, 0, 3);
    assert_eq!(entries[0], (0x1001, 36, 60));
    assert_eq!(entries[1], (0x1011, 96, 20));
    assert_eq!(entries[2], (0x1012, 116, 3));

    // Basic info
    assert_eq!(u32_at(&bytes, 36), 1);
    assert_eq!(&bytes[40..44], b"Sony");
    assert_eq!(&bytes[56..63], b"IMX-219");
    assert_eq!(&bytes[72..79], b"3.23.04");
    assert_eq!(u32_at(&bytes, 88), 3);
    assert_eq!(u32_at(&bytes, 92), 0x3);

    assert_eq!(&bytes[96..116], &SCRIPT_BLOB);
    assert_eq!(&bytes[116..], &[7, 7, 7]);
}

#[test]
fn test_camera_from_flags_with_defaults() {
    let project = TestProject::new();
    project.create_binary("fps.bin", &[30, 0, 0, 0]);

    let output = run_gardimage(
        &project,
        &[
            "camera",
            "-o",
            "cam.bin",
            "--camconfcmnd",
            "SET_FPS=fps.bin",
            "--basicconf",
            "ModelNo=OV5640,Interfaces=gpio",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let bytes = project.read_binary("cam.bin");
    assert_eq!(bytes.len(), 24 + 60 + 4);
    assert_eq!(entries_at(&bytes, 0, 2)[1], (0x1013, 84, 4));
    assert_eq!(&bytes[28..35], b"Lattice");
    assert_eq!(&bytes[44..50], b"OV5640");
    assert_eq!(&bytes[60..65], b"1.0.0");
    assert_eq!(u32_at(&bytes, 80), 0x4);
}

#[test]
fn test_camera_output_feeds_root_image() {
    let project = TestProject::new();
    project.create_file("start.txt", SAMPLE_SCRIPT);

    let output = run_gardimage(
        &project,
        &["camera", "-o", "cam.bin", "--camconfcmnd", "0x1011=start.txt"],
    );
    assert!(output.status.success());
    let camera = project.read_binary("cam.bin");

    let output = run_gardimage(
        &project,
        &["root", "-o", "root.bin", "--alignment", "0x1000", "--camconf", "0x3001=cam.bin"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let image = project.read_binary("root.bin");
    assert_eq!(entries_at(&image, 0x1000, 1)[0], (0x3001, 0x1000, camera.len() as u32));
    assert_eq!(&image[0x2000..], camera.as_slice());
}

#[test]
fn test_unknown_command_name() {
    let project = TestProject::new();
    project.create_binary("x.bin", &[1]);

    let output = run_gardimage(
        &project,
        &["camera", "-o", "cam.bin", "--camconfcmnd", "SET_ZOOM=x.bin"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown camera configuration command"));
    assert!(!project.file_exists("cam.bin"));
}

#[test]
fn test_duplicate_command() {
    let project = TestProject::new();
    project.create_binary("x.bin", &[1]);

    let output = run_gardimage(
        &project,
        &[
            "camera",
            "-o",
            "cam.bin",
            "--camconfcmnd",
            "0x1011=x.bin",
            "--camconfcmnd",
            "START_STREAM=x.bin",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("passed multiple times"));
}

#[test]
fn test_missing_command_file() {
    let project = TestProject::new();
    let output = run_gardimage(
        &project,
        &["camera", "-o", "cam.bin", "--camconfcmnd", "SET_FPS=gone.txt"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}
