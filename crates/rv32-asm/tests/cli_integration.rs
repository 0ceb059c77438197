//! Integration tests for the rv32-asm CLI.

use rstest as _;
use rv32_asm as _;
use rv32_core as _;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing as _;
use tracing_subscriber as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("rv32-asm")
}

fn create_temp_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn build_simple_program() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "simple.s", "add x0, x1, x2\nnop\n");

    let output = temp_dir.path().join("simple.bin");

    let status = Command::new(binary_path())
        .args([
            "build",
            source.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run rv32-asm");

    assert!(status.success());

    let binary = fs::read(&output).unwrap();
    assert_eq!(binary, [0x33, 0x80, 0x20, 0x00, 0x13, 0x00, 0x00, 0x00]);
}

#[test]
fn build_with_default_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "prog.s", "nop\n");

    let expected_output = temp_dir.path().join("prog.bin");

    let status = Command::new(binary_path())
        .args(["build", source.to_str().unwrap()])
        .current_dir(temp_dir.path())
        .status()
        .expect("failed to run rv32-asm");

    assert!(status.success());
    assert!(expected_output.exists());
}

#[test]
fn build_verbose_prints_listing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "list.s", "start:\n  li a0, 0x12345678\n");

    let output = Command::new(binary_path())
        .args(["build", source.to_str().unwrap(), "-v"])
        .output()
        .expect("failed to run rv32-asm");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("00000000: 12345537 ; line 2"), "{stdout}");
    assert!(stdout.contains("00000004: 67850513 ; line 2"), "{stdout}");
}

#[test]
fn build_reports_errors_with_preview() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "bad.s", "nop\nadd x1, x2,\n");

    let output = Command::new(binary_path())
        .args(["build", source.to_str().unwrap()])
        .output()
        .expect("failed to run rv32-asm");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("bad.s:2:12: error: unexpected end of input"),
        "{stderr}"
    );
    assert!(stderr.contains("2 | add x1, x2,"), "{stderr}");
    assert!(!temp_dir.path().join("bad.bin").exists());
}

#[test]
fn run_prints_register_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "sum.s",
        "li a0, 15\nadd a1, a0, a2\nneg a3, a0\n",
    );

    let output = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--reg", "a2=0x10"])
        .output()
        .expect("failed to run rv32-asm");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pc: 0x0000000c  ticks: 3"), "{stdout}");
    assert!(stdout.contains("x10   a0 = 0x0000000f (15)"), "{stdout}");
    assert!(stdout.contains("x11   a1 = 0x0000001f (31)"), "{stdout}");
    assert!(stdout.contains("x13   a3 = 0xfffffff1 (-15)"), "{stdout}");
    assert!(stdout.contains("x2    sp = 0x7ffffff0"), "{stdout}");
}

#[test]
fn run_stops_at_tick_limit() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "spin.s", "spin: j spin\n");

    let output = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--max-ticks", "25"])
        .output()
        .expect("failed to run rv32-asm");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("did not finish within 25 ticks"), "{stderr}");
}

#[test]
fn run_reports_datapath_faults() {
    let temp_dir = tempfile::tempdir().unwrap();
    // The word at 0xFFFF_FFFF runs past the end of the address space.
    let source = create_temp_file(temp_dir.path(), "fault.s", "lw a0, -1(zero)\n");

    let output = Command::new(binary_path())
        .args(["run", source.to_str().unwrap()])
        .output()
        .expect("failed to run rv32-asm");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("(pc 0x00000000)"), "{stderr}");
}

#[test]
fn run_rejects_unknown_register_option() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "nop.s", "nop\n");

    let output = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--reg", "bogus=1"])
        .output()
        .expect("failed to run rv32-asm");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown register: bogus"), "{stderr}");
}

#[test]
fn help_shows_usage() {
    let output = Command::new(binary_path())
        .arg("--help")
        .output()
        .expect("failed to run rv32-asm");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: rv32-asm"));
}

#[test]
fn unknown_command_fails() {
    let output = Command::new(binary_path())
        .arg("frobnicate")
        .output()
        .expect("failed to run rv32-asm");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown command"));
}
