// Build script to compile GLSL shaders to SPIR-V

use std::path::Path;
use std::process::Command;

const SHADERS: &[&str] = &["assets/shaders/tri.vert", "assets/shaders/tri.frag"];

fn main() {
    println!("cargo:rerun-if-changed=assets/shaders/");

    // Compile shaders using glslc (part of Vulkan SDK)
    for shader in SHADERS {
        compile_shader(shader, &format!("{}.spv", shader));
    }
}

fn compile_shader(input: &str, output: &str) {
    let input_path = Path::new(input);
    let output_path = Path::new(output);

    println!("cargo:rerun-if-changed={}", input);

    let result = Command::new("glslc")
        .arg(input_path)
        .arg("-o")
        .arg(output_path)
        .status();

    // Never fatal: the shaders can be compiled by hand and the library
    // does not need them to build
    match result {
        Ok(status) if status.success() => {}
        Ok(status) => {
            println!(
                "cargo:warning=Failed to compile {}: exit code {:?}",
                input,
                status.code()
            );
        }
        Err(e) => {
            println!("cargo:warning=glslc not found ({}); shaders not compiled", e);
            println!("cargo:warning=  glslc {} -o {}", input, output);
        }
    }
}
