//! Working-directory layout inside the staging container.
//!
//! This is a contract with the compiler that runs on the worker: download targets here must
//! match the paths the build script reads from and writes to.

pub const COMPILER_DIR: &str = "/tmp/compiler";
pub const APP_DIR: &str = "/app";
pub const BUILDPACKS_DIR: &str = "/tmp/buildpacks";
pub const OUTPUT_DIR: &str = "/tmp/droplet";
pub const RESULT_DIR: &str = "/tmp";

/// Build script shipped inside the compiler archive.
pub fn script() -> String {
    format!("{COMPILER_DIR}/run")
}

/// Arguments for the build script.
pub fn script_args(buildpack_order: &[&str]) -> Vec<String> {
    vec![
        format!("-appDir={APP_DIR}"),
        format!("-buildpacksDir={BUILDPACKS_DIR}"),
        format!("-buildpackOrder={}", buildpack_order.join(",")),
        format!("-outputDir={OUTPUT_DIR}"),
        format!("-resultDir={RESULT_DIR}"),
    ]
}

/// Extraction directory for a buildpack.
///
/// The key is hex-encoded so arbitrary keys map to distinct, flat directory names.
pub fn buildpack_path(key: &str) -> String {
    let mut dir = String::with_capacity(BUILDPACKS_DIR.len() + 1 + key.len() * 2);
    dir.push_str(BUILDPACKS_DIR);
    dir.push('/');
    for b in key.bytes() {
        dir.push_str(&format!("{b:02x}"));
    }
    dir
}

pub fn droplet_archive_path() -> String {
    format!("{OUTPUT_DIR}/droplet.tgz")
}

pub fn result_json_path() -> String {
    format!("{RESULT_DIR}/result.json")
}
