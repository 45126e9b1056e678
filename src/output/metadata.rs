//! Code for writing metadata to file
use anyhow::Result;
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata<'a>,
    platform: PlatformMetadata,
}

/// Information about the model run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the model which was run
    model_path: &'a Path,
    /// The date and time on which the run started
    datetime: String,
}

impl<'a> RunMetadata<'a> {
    fn new(model_path: &'a Path) -> Self {
        let dt = Local::now();
        Self {
            model_path,
            datetime: dt.to_rfc2822(),
        }
    }
}

/// Information about the program build
#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// The target architecture for the build (e.g. x86_64-unknown-linux-gnu)
    target: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
    /// The version of rustc used for compilation
    rustc_version: &'a str,
    /// When the program was built
    build_time_utc: &'a str,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
        }
    }
}

/// Information about the platform the program is running on
#[derive(Serialize)]
struct PlatformMetadata {
    /// The operating system name
    system: String,
    /// The operating system release
    release: String,
    /// The machine architecture
    machine: String,
}

impl PlatformMetadata {
    fn new() -> Self {
        match PlatformInfo::new() {
            Ok(info) => Self {
                system: info.sysname().to_string_lossy().into_owned(),
                release: info.release().to_string_lossy().into_owned(),
                machine: info.machine().to_string_lossy().into_owned(),
            },
            Err(_) => Self {
                system: "unknown".into(),
                release: "unknown".into(),
                machine: "unknown".into(),
            },
        }
    }
}

/// Write metadata about the run to the output folder.
///
/// # Arguments
///
/// * `output_path` - The output folder
/// * `model_path` - The folder containing the model which was run
pub fn write_metadata(output_path: &Path, model_path: &Path) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata::new(model_path),
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::new(),
    };

    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(file_path, toml::to_string(&metadata)?)?;

    Ok(())
}
