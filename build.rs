use std::env;

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    // Only the `taskcore-x86` binary needs the kernel linker script; the host-side
    // `tests/boot.rs` integration test and the crate's own unit tests are ordinary
    // host executables and must link normally.
    println!("cargo:rustc-link-arg-bins=-T{}/linker.ld", manifest_dir);
    println!("cargo:rerun-if-changed=linker.ld");
    println!("cargo:rerun-if-changed=src/boot.rs");
}
