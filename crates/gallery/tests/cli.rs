use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn gallery() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gallery"));
    command.env("RUST_LOG", "warn");
    command
}

#[test]
fn list_prints_every_example() {
    let output = gallery()
        .arg("list")
        .output()
        .expect("failed to run gallery list");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BasicStencil"), "{stdout}");
    assert!(stdout.contains("ComputeUniforms"), "{stdout}");
    assert_eq!(stdout.lines().count(), 2, "{stdout}");
}

#[test]
fn where_honours_env_overrides() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    let content_dir = root.path().join("content");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("gallery.toml"),
        "[window]\nwidth = 1024\nheight = 768\n",
    )
    .unwrap();

    let output = gallery()
        .env("GALLERY_CONFIG_DIR", &config_dir)
        .env("GALLERY_CONTENT_DIR", &content_dir)
        .arg("where")
        .output()
        .expect("failed to run gallery where");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let settings_file = config_dir.join("gallery.toml");
    assert!(
        stdout.contains(&format!("Settings file: {} (present)", settings_file.display())),
        "{stdout}"
    );
    assert!(
        stdout.contains(&format!("Content dir:   {}", content_dir.display())),
        "{stdout}"
    );
    assert!(stdout.contains("Window size:   1024x768"), "{stdout}");
}

#[test]
fn invalid_settings_file_is_reported() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("gallery.toml"), "[window]\nwidth = 0\n").unwrap();

    let output = gallery()
        .env("GALLERY_CONFIG_DIR", root.path())
        .arg("where")
        .output()
        .expect("failed to run gallery where");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("window size must be non-zero"), "{stderr}");
}

#[test]
fn capture_rejects_unknown_example() {
    let root = TempDir::new().unwrap();
    let output = gallery()
        .env("GALLERY_CONFIG_DIR", root.path())
        .args(["capture", "NoSuchExample", "--output"])
        .arg(root.path().join("out.png"))
        .output()
        .expect("failed to run gallery capture");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown example 'NoSuchExample'"), "{stderr}");
    assert!(stderr.contains("BasicStencil, ComputeUniforms"), "{stderr}");
    assert!(!root.path().join("out.png").exists());
}
