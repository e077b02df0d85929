use std::path::Path;

use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::ShaderStage;

fn validate(file_name: &str, stage: ShaderStage) -> wgpu::naga::Module {
    let path = samples::content_dir()
        .join(harness::assets::SHADER_SOURCE_DIR)
        .join(file_name);
    let source = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    let module = Frontend::default()
        .parse(&Options::from(stage), &source)
        .unwrap_or_else(|err| panic!("{file_name} failed to parse: {err:?}"));
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|err| panic!("{file_name} failed validation: {err:?}"));
    module
}

#[test]
fn position_color_vertex_shader_is_valid() {
    let module = validate("PositionColor.vert", ShaderStage::Vertex);
    assert_eq!(module.entry_points.len(), 1);
    assert_eq!(module.entry_points[0].name, "main");
}

#[test]
fn solid_color_fragment_shader_is_valid() {
    let module = validate("SolidColor.frag", ShaderStage::Fragment);
    assert_eq!(module.entry_points[0].stage, ShaderStage::Fragment);
}

#[test]
fn gradient_compute_shader_uses_eight_by_eight_groups() {
    let module = validate("GradientTexture.comp", ShaderStage::Compute);
    let entry = &module.entry_points[0];
    assert_eq!(entry.stage, ShaderStage::Compute);
    assert_eq!(
        entry.workgroup_size,
        [
            samples::compute_uniforms::WORKGROUP_SIZE,
            samples::compute_uniforms::WORKGROUP_SIZE,
            1
        ]
    );
}

#[test]
fn shader_stages_are_inferred_from_bundled_file_names() {
    use harness::ShaderStage as Stage;
    let source = samples::content_dir().join(harness::assets::SHADER_SOURCE_DIR);
    assert!(Path::new(&source).is_dir());
    assert_eq!(Stage::from_file_name("PositionColor.vert").unwrap(), Stage::Vertex);
    assert_eq!(Stage::from_file_name("SolidColor.frag").unwrap(), Stage::Fragment);
    assert_eq!(Stage::from_file_name("GradientTexture.comp").unwrap(), Stage::Compute);
}
