//! Integration tests for the virtfact binary
//!
//! The host filesystem is faked by pointing `--root` at a temporary directory.

use std::{fs, path::Path, process::Command};

use tempfile::TempDir;

fn virtfact(root: &Path, args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_virtfact"))
        .arg("--kernel")
        .arg("Linux")
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to run virtfact");
    assert!(output.status.success(), "virtfact failed: {output:?}");
    String::from_utf8(output.stdout).expect("Output is not UTF-8")
}

fn write(root: &TempDir, path: &str, content: &str) {
    let path = root.path().join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// An empty root has no evidence of anything
#[test]
fn test_physical() {
    let root = TempDir::new().expect("Failed to create temp dir");
    assert_eq!(
        virtfact(root.path(), &["facts"]),
        "virtual => physical\nis_virtual => false\n"
    );
}

#[test]
fn test_kvm_facts() {
    let root = TempDir::new().expect("Failed to create temp dir");
    write(
        &root,
        "proc/cpuinfo",
        "processor\t: 0\nmodel name\t: QEMU Virtual CPU version 2.5+\n",
    );

    assert_eq!(
        virtfact(root.path(), &["facts"]),
        "virtual => kvm\nis_virtual => true\n"
    );

    let json: serde_json::Value =
        serde_json::from_str(&virtfact(root.path(), &["facts", "--format", "json"])).unwrap();
    assert_eq!(json["virtual"], "kvm");
    assert_eq!(json["is_virtual"], true);
}

#[test]
fn test_probe() {
    let root = TempDir::new().expect("Failed to create temp dir");
    write(&root, "sys/devices/virtual/dmi/id/product_name", "VirtualBox\n");
    write(&root, "proc/self/status", "Name:\tcat\nVxID:\t40128\n");
    fs::create_dir_all(root.path().join("proc/virtual")).unwrap();

    assert_eq!(
        virtfact(root.path(), &["probe", "virtualbox"]),
        "virtualbox => true\n"
    );
    assert_eq!(virtfact(root.path(), &["probe", "xen"]), "xen => false\n");
    assert_eq!(
        virtfact(root.path(), &["probe", "vserver"]),
        "vserver => true\nvserver_type => vserver_host\n"
    );
    assert_eq!(
        virtfact(root.path(), &["facts", "--format", "yaml"]),
        "virtual: vserver_host\nis_virtual: false\n"
    );
}

#[test]
fn test_openvz_host_node_under_root() {
    let root = TempDir::new().expect("Failed to create temp dir");
    write(&root, "proc/vz/vzquota", "");
    write(&root, "proc/self/status", "Name:\tcat\nenvID:\t0\n");

    assert_eq!(
        virtfact(root.path(), &["facts"]),
        "virtual => openvzhn\nis_virtual => false\n"
    );
    assert_eq!(
        virtfact(root.path(), &["probe", "openvz"]),
        "openvz => true\nopenvz_type => openvzhn\n"
    );
}
