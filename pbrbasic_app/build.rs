// build.rs
// Compiles the GLSL shaders under resources/shaders into target/shaders

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Compile every stage file below `shader_dir`, mirroring its subdirectories
fn compile_shaders_recursive(shader_dir: &Path, target_dir: &Path, glslc: &Path, compiled_count: &mut u32) {
    let Ok(entries) = std::fs::read_dir(shader_dir) else {
        println!("cargo:warning=No shader directory found at {}", shader_dir.display());
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            continue;
        };

        if path.is_dir() {
            compile_shaders_recursive(&path, &target_dir.join(&name), glslc, compiled_count);
            continue;
        }

        let is_stage = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("vert" | "frag" | "comp" | "geom" | "tesc" | "tese")
        );
        if !is_stage {
            continue;
        }

        if let Err(e) = std::fs::create_dir_all(target_dir) {
            println!("cargo:warning=Failed to create {}: {e}", target_dir.display());
            return;
        }

        // pbr.vert -> pbr.vert.spv
        let out_file = target_dir.join(format!("{name}.spv"));
        let up_to_date = match (std::fs::metadata(&path), std::fs::metadata(&out_file)) {
            (Ok(src), Ok(dst)) => matches!((src.modified(), dst.modified()), (Ok(s), Ok(d)) if s <= d),
            _ => false,
        };
        if up_to_date {
            continue;
        }

        match Command::new(glslc).arg(&path).arg("-o").arg(&out_file).status() {
            Ok(status) if status.success() => *compiled_count += 1,
            Ok(status) => println!("cargo:warning=glslc failed for {} ({status})", path.display()),
            Err(e) => println!("cargo:warning=Failed to run glslc for {}: {e}", path.display()),
        }
    }
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string()));
    let workspace_dir = manifest_dir.parent().map_or_else(|| manifest_dir.clone(), Path::to_path_buf);
    let shader_dir = workspace_dir.join("resources/shaders");
    let target_dir = workspace_dir.join("target/shaders");

    println!("cargo:rerun-if-changed={}", shader_dir.display());
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    if env::var_os("SKIP_SHADERS").is_some() {
        return;
    }

    // Shader compilation is optional: without the SDK, prebuilt binaries are used
    let Some(vulkan_sdk) = env::var_os("VULKAN_SDK") else {
        return;
    };
    let glslc = if cfg!(target_os = "windows") {
        Path::new(&vulkan_sdk).join("Bin").join("glslc.exe")
    } else {
        Path::new(&vulkan_sdk).join("bin").join("glslc")
    };
    if !glslc.exists() {
        println!("cargo:warning=glslc not found at {}", glslc.display());
        return;
    }

    let mut compiled_count = 0;
    compile_shaders_recursive(&shader_dir, &target_dir, &glslc, &mut compiled_count);
    if compiled_count > 0 {
        println!("cargo:warning=Compiled {compiled_count} shader(s) into {}", target_dir.display());
    }
}
