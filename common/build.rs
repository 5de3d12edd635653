// This file is executed before the build and fetch the commit hash from git
// we create the build version and set it as an environment variable for the build.

use std::process::Command;

fn main() {
    let commit_hash = if let Some(hash) = option_env!("TDSFDW_COMMIT_HASH") {
        hash.chars().take(7).collect()
    } else {
        // Git missing or not a checkout: fall back to "unknown"
        match Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
        {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            _ => "unknown".to_string(),
        }
    };

    let build_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), commit_hash);
    println!("cargo:rerun-if-env-changed=TDSFDW_COMMIT_HASH");
    println!("cargo:rustc-env=BUILD_VERSION={build_version}");
}
