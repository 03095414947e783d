//! End-to-end test for the full container pipeline.
//!
//! Requires root, cgroup v1 CPU and memory hierarchies, and a static
//! busybox on the host; skips itself (with a message) when any
//! precondition is missing, since the pipeline issues real privileged
//! kernel operations.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::print_stderr)]

use std::os::fd::AsRawFd;
use std::path::Path;

use boxcell_common::types::{CgroupLimits, ContainerId, ContainerSpec, IsolationLevel};

const BUSYBOX: &str = "/bin/busybox";

fn preconditions_met() -> bool {
    if !nix::unistd::Uid::effective().is_root() {
        eprintln!("skipping e2e: requires root");
        return false;
    }
    if !Path::new("/sys/fs/cgroup/cpu").is_dir() || !Path::new("/sys/fs/cgroup/memory").is_dir() {
        eprintln!("skipping e2e: cgroup v1 cpu/memory hierarchies not mounted");
        return false;
    }
    if !Path::new(BUSYBOX).exists() {
        eprintln!("skipping e2e: {BUSYBOX} not present");
        return false;
    }
    true
}

/// Builds a minimal image archive: busybox plus the directories the
/// mount sequence expects to find in the root.
fn write_minimal_image(image_dir: &Path) {
    let staging = image_dir.join("staging");
    for dir in ["bin", "proc", "sys", "dev", "tmp"] {
        std::fs::create_dir_all(staging.join(dir)).expect("mkdir");
    }
    std::fs::copy(BUSYBOX, staging.join("bin/busybox")).expect("copy busybox");

    let file = std::fs::File::create(image_dir.join("mini.tar")).expect("create tar");
    let mut builder = tar::Builder::new(file);
    builder.append_dir_all(".", &staging).expect("append tree");
    builder.finish().expect("finish tar");
    std::fs::remove_dir_all(&staging).expect("cleanup staging");
}

/// Runs `f` with fd 1 pointed at a file, restoring it afterward, and
/// returns what the callee wrote. The redirected fd is inherited by the
/// container child, so its stdout lands on the host filesystem even
/// after the root switch.
fn capture_stdout<T>(path: &Path, f: impl FnOnce() -> T) -> (T, String) {
    let out = std::fs::File::create(path).expect("create capture file");
    let saved = nix::unistd::dup(1).expect("dup stdout");
    nix::unistd::dup2(out.as_raw_fd(), 1).expect("redirect stdout");
    let result = f();
    nix::unistd::dup2(saved, 1).expect("restore stdout");
    nix::unistd::close(saved).expect("close saved fd");
    (result, std::fs::read_to_string(path).expect("read capture file"))
}

#[test]
fn trivial_command_exits_zero_through_full_pipeline() {
    if !preconditions_met() {
        return;
    }

    let workdir = tempfile::tempdir().expect("tempdir");
    let image_dir = workdir.path().join("images");
    let container_dir = workdir.path().join("containers");
    std::fs::create_dir_all(&image_dir).expect("mkdir");
    std::fs::create_dir_all(&container_dir).expect("mkdir");
    write_minimal_image(&image_dir);

    let marker = "boxcell-pipeline-check";
    let spec = ContainerSpec {
        id: ContainerId::generate(),
        command: vec!["/bin/busybox".into(), "echo".into(), marker.into()],
        image_name: "mini".into(),
        image_dir,
        container_dir: container_dir.clone(),
        limits: CgroupLimits::default(),
        isolation: IsolationLevel::MountOnly,
        user: None,
    };

    let (report, output) = capture_stdout(&workdir.path().join("out.txt"), || {
        boxcell_runtime::run(&spec)
    });
    let report = report.expect("run should complete");
    assert_eq!(report.status, 0, "contained command should exit cleanly");
    assert!(!report.setup_failed());
    assert!(
        output.contains(marker),
        "contained command's stdout should reach the host: {output:?}"
    );
    assert!(container_dir.join(spec.id.as_str()).exists());
}

#[test]
fn failing_setup_reports_distinguished_status() {
    if !preconditions_met() {
        return;
    }

    let workdir = tempfile::tempdir().expect("tempdir");
    let image_dir = workdir.path().join("images");
    let container_dir = workdir.path().join("containers");
    std::fs::create_dir_all(&image_dir).expect("mkdir");
    std::fs::create_dir_all(&container_dir).expect("mkdir");
    write_minimal_image(&image_dir);

    // Command missing from the image: setup succeeds up to exec, which
    // then fails inside the child.
    let spec = ContainerSpec {
        id: ContainerId::generate(),
        command: vec!["/bin/no-such-program".into()],
        image_name: "mini".into(),
        image_dir,
        container_dir,
        limits: CgroupLimits::default(),
        isolation: IsolationLevel::MountOnly,
        user: None,
    };

    let report = boxcell_runtime::run(&spec).expect("run should complete");
    assert!(report.setup_failed(), "exec failure must map to the setup status");
}
