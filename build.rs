//! Build-time SIMD configuration
//!
//! Emits `hashlab_simd` when the target architecture can host the vectorized
//! bucket scans. Actual instruction selection still happens at runtime via
//! `is_x86_feature_detected!`; this flag only gates compilation of the
//! intrinsic paths.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rustc-check-cfg=cfg(hashlab_simd)");

    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    if cfg!(feature = "simd") {
        match target_arch.as_str() {
            "x86_64" => println!("cargo:rustc-cfg=hashlab_simd"),
            _ => println!(
                "cargo:warning=SIMD bucket scans not available for target architecture: {}",
                target_arch
            ),
        }
    }
}
