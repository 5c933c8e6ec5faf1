//! Touching a key against its protection must kill the process.
//!
//! Each scenario runs as an ignored test inside a child copy of this test
//! binary; the parent only checks that the child died from a signal.

#![cfg(target_family = "unix")]

use std::os::unix::process::ExitStatusExt;
use std::process::Command;

use guarded_keys::{Key, SecretKey};

const CHILD_ENV: &str = "GUARDED_KEYS_FAULT_CHILD";

/// Runs an ignored test as a subprocess and returns the signal that
/// terminated it, if any.
fn run_test_as_subprocess(test_name: &str) -> Option<i32> {
    let exe = std::env::current_exe().expect("Failed to get current exe");
    let status = Command::new(exe)
        .args([
            "--exact",
            test_name,
            "--ignored",
            "--test-threads=1",
            "--nocapture",
        ])
        .env(CHILD_ENV, "1")
        .status()
        .expect("Failed to run subprocess");

    assert!(!status.success(), "{test_name} survived the access");
    status.signal()
}

fn is_child() -> bool {
    std::env::var_os(CHILD_ENV).is_some()
}

fn assert_faults(test_name: &str) {
    let signal = run_test_as_subprocess(test_name);
    assert!(
        matches!(signal, Some(libc::SIGSEGV) | Some(libc::SIGBUS)),
        "{test_name} ended with {signal:?} instead of a memory fault"
    );
}

#[test]
fn write_after_readonly_faults() {
    assert_faults("child_write_after_readonly");
}

#[test]
#[ignore = "run as a subprocess by write_after_readonly_faults"]
fn child_write_after_readonly() {
    if !is_child() {
        return;
    }

    let mut key = SecretKey::uninit(32).unwrap();
    key.readonly().unwrap();
    unsafe { key.as_mut_ptr().write_volatile(0xFF) };
}

#[test]
fn randomize_readonly_key_faults() {
    assert_faults("child_randomize_readonly_key");
}

#[test]
#[ignore = "run as a subprocess by randomize_readonly_key_faults"]
fn child_randomize_readonly_key() {
    if !is_child() {
        return;
    }

    let mut key = SecretKey::new(32).unwrap();
    let _ = key.randomize();
}

#[test]
fn read_noaccess_key_faults() {
    assert_faults("child_read_noaccess_key");
}

#[test]
#[ignore = "run as a subprocess by read_noaccess_key_faults"]
fn child_read_noaccess_key() {
    if !is_child() {
        return;
    }

    let mut key = SecretKey::new(32).unwrap();
    key.noaccess().unwrap();
    let first = unsafe { key.as_bytes().as_ptr().read_volatile() };
    println!("read {first}");
}

#[test]
fn clone_noaccess_key_faults() {
    assert_faults("child_clone_noaccess_key");
}

#[test]
#[ignore = "run as a subprocess by clone_noaccess_key_faults"]
fn child_clone_noaccess_key() {
    if !is_child() {
        return;
    }

    let mut key = Key::<32>::new().unwrap();
    key.noaccess().unwrap();
    let _ = key.try_clone();
}

#[test]
fn write_after_noaccess_faults() {
    assert_faults("child_write_after_noaccess");
}

#[test]
#[ignore = "run as a subprocess by write_after_noaccess_faults"]
fn child_write_after_noaccess() {
    if !is_child() {
        return;
    }

    let mut key = SecretKey::uninit(16).unwrap();
    key.noaccess().unwrap();
    unsafe { key.as_mut_ptr().write_volatile(0xFF) };
}

#[test]
fn overrun_past_the_end_faults() {
    assert_faults("child_overrun_past_the_end");
}

#[test]
#[ignore = "run as a subprocess by overrun_past_the_end_faults"]
fn child_overrun_past_the_end() {
    if !is_child() {
        return;
    }

    let mut key = SecretKey::uninit(24).unwrap();
    let len = key.len();
    unsafe { key.as_mut_ptr().add(len).write_volatile(0xFF) };
}
