#![cfg(feature = "gpu-tests")]

use harness::{headless, Context, Example, HarnessConfig, RenderTarget};
use samples::{BasicStencil, ComputeUniforms};
use image::RgbaImage;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn config() -> HarnessConfig {
    HarnessConfig {
        window_size: (WIDTH, HEIGHT),
        base_path: samples::content_dir(),
        ..HarnessConfig::default()
    }
}

fn adapter_available(name: &str) -> bool {
    let available = headless::adapter_available();
    if !available {
        eprintln!("skipping {name}: no GPU adapter available");
    }
    available
}

fn offscreen_context(name: &'static str) -> Context {
    Context::new(
        name,
        RenderTarget::Offscreen {
            width: WIDTH,
            height: HEIGHT,
        },
        &config(),
    )
}

fn capture(name: &str, frames: u32) -> Option<RgbaImage> {
    if !adapter_available(name) {
        return None;
    }
    let registry = samples::registry().unwrap();
    let entry = registry.get(registry.position(name).unwrap());
    Some(headless::capture(entry, &config(), frames).unwrap())
}

/// Pixel covering normalized device coordinates `(x, y)`.
fn pixel_at_ndc(image: &RgbaImage, x: f32, y: f32) -> [u8; 4] {
    let px = ((x + 1.0) * 0.5 * image.width() as f32) as u32;
    let py = ((1.0 - y) * 0.5 * image.height() as f32) as u32;
    image
        .get_pixel(px.min(image.width() - 1), py.min(image.height() - 1))
        .0
}

fn assert_stencil_hole(image: &RgbaImage) {
    let (width, _) = image.dimensions();
    let masked = pixel_at_ndc(image, 0.0, -0.1);
    assert_eq!(masked, [0, 0, 0, 255], "masked area must stay black");

    let ring = pixel_at_ndc(image, 0.0, -0.75);
    assert_eq!(ring[3], 255);
    assert!(
        ring[..3].iter().any(|channel| *channel > 32),
        "area between triangles should be colored: {ring:?}"
    );

    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(width - 1, 0).0, [0, 0, 0, 255]);
}

fn assert_gradient(image: &RgbaImage, time: f32, points: &[(u32, u32)]) {
    let (width, height) = image.dimensions();
    for &(x, y) in points {
        let expected = samples::compute_uniforms::gradient_color(x, y, width, height, time);
        let actual = image.get_pixel(x, y).0;
        for channel in 0..3 {
            let want = (expected[channel] * 255.0).round();
            let got = f32::from(actual[channel]);
            assert!(
                (want - got).abs() <= 3.0,
                "pixel ({x}, {y}) channel {channel}: expected {want}, got {got}"
            );
        }
        assert_eq!(actual[3], 255);
    }
}

#[test]
fn basic_stencil_cuts_hole_into_rgb_triangle() {
    let Some(image) = capture("BasicStencil", 1) else {
        return;
    };
    assert_eq!(image.dimensions(), (WIDTH, HEIGHT));
    assert_stencil_hole(&image);
}

#[test]
fn compute_uniforms_matches_gradient_formula() {
    let Some(image) = capture("ComputeUniforms", 1) else {
        return;
    };
    let time = samples::compute_uniforms::TIME_STEP;
    assert_gradient(&image, time, &[(0, 0), (320, 240), (639, 0), (17, 401)]);
}

#[test]
fn basic_stencil_follows_target_resize() {
    if !adapter_available("BasicStencil") {
        return;
    }
    let mut example = BasicStencil::new();
    let mut context = offscreen_context("BasicStencil");
    example.init(&mut context).unwrap();
    example.draw(&mut context).unwrap();

    context.resize(320, 200).unwrap();
    example.draw(&mut context).unwrap();
    let image = context.gpu().unwrap().read_target().unwrap();
    example.quit(&mut context);

    assert_eq!(image.dimensions(), (320, 200));
    assert_stencil_hole(&image);
}

#[test]
fn compute_uniforms_follows_target_resize() {
    if !adapter_available("ComputeUniforms") {
        return;
    }
    let mut example = ComputeUniforms::new();
    let mut context = offscreen_context("ComputeUniforms");
    example.init(&mut context).unwrap();
    example.update(&mut context).unwrap();
    example.draw(&mut context).unwrap();

    context.resize(100, 60).unwrap();
    example.update(&mut context).unwrap();
    example.draw(&mut context).unwrap();
    let image = context.gpu().unwrap().read_target().unwrap();
    let time = example.time();
    example.quit(&mut context);

    assert_eq!(image.dimensions(), (100, 60));
    assert_gradient(&image, time, &[(0, 0), (50, 30), (99, 0), (99, 59), (7, 41)]);
}
