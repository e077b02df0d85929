use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Result};
use harness::{headless, Context, Example, ExampleEntry, HarnessConfig};

static FAILING_QUITS: AtomicUsize = AtomicUsize::new(0);

struct FailsDuringInit;

impl Example for FailsDuringInit {
    fn name(&self) -> &'static str {
        "FailsDuringInit"
    }

    fn init(&mut self, _context: &mut Context) -> Result<()> {
        bail!("missing shader")
    }

    fn update(&mut self, _context: &mut Context) -> Result<()> {
        unreachable!("update must not run after a failed init")
    }

    fn draw(&mut self, _context: &mut Context) -> Result<()> {
        unreachable!("draw must not run after a failed init")
    }

    fn quit(&mut self, context: &mut Context) {
        FAILING_QUITS.fetch_add(1, Ordering::SeqCst);
        context.common_quit();
    }
}

#[test]
fn capture_reports_init_errors_and_still_quits() {
    let entry = ExampleEntry {
        name: "FailsDuringInit",
        summary: "init always fails",
        build: || Box::new(FailsDuringInit),
    };

    let err = headless::capture(&entry, &HarnessConfig::default(), 3).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("FailsDuringInit"), "{message}");
    assert!(message.contains("missing shader"), "{message}");
    assert_eq!(FAILING_QUITS.load(Ordering::SeqCst), 1);
}

#[cfg(feature = "gpu-tests")]
mod gpu {
    use super::*;

    /// Clears the target to a fixed colour every frame.
    struct ClearScreen;

    impl Example for ClearScreen {
        fn name(&self) -> &'static str {
            "ClearScreen"
        }

        fn init(&mut self, context: &mut Context) -> Result<()> {
            context.common_init()
        }

        fn update(&mut self, _context: &mut Context) -> Result<()> {
            Ok(())
        }

        fn draw(&mut self, context: &mut Context) -> Result<()> {
            let gpu = context.gpu()?;
            let frame = gpu.acquire_frame()?;
            let mut encoder = gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
            if let Some(frame) = frame.as_ref() {
                let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("clear"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 1.0,
                                g: 0.0,
                                b: 1.0,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
            }
            gpu.submit(encoder, frame);
            Ok(())
        }

        fn quit(&mut self, context: &mut Context) {
            context.common_quit();
        }
    }

    #[test]
    fn offscreen_clear_is_read_back() {
        if !headless::adapter_available() {
            eprintln!("skipping: no GPU adapter available");
            return;
        }
        let entry = ExampleEntry {
            name: "ClearScreen",
            summary: "clears to magenta",
            build: || Box::new(ClearScreen),
        };
        let config = HarnessConfig {
            window_size: (70, 30),
            ..HarnessConfig::default()
        };

        let image = headless::capture(&entry, &config, 2).unwrap();

        assert_eq!(image.dimensions(), (70, 30));
        for pixel in [image.get_pixel(0, 0), image.get_pixel(69, 29)] {
            assert_eq!(pixel.0, [255, 0, 255, 255]);
        }
    }

    fn clear_screen_context(width: u32, height: u32) -> Context {
        Context::new(
            "ClearScreen",
            harness::RenderTarget::Offscreen { width, height },
            &HarnessConfig::default(),
        )
    }

    #[test]
    fn reinitialising_replaces_the_gpu_context() {
        if !headless::adapter_available() {
            eprintln!("skipping: no GPU adapter available");
            return;
        }
        let mut example = ClearScreen;
        let mut context = clear_screen_context(32, 16);

        example.init(&mut context).unwrap();
        example.init(&mut context).unwrap();
        assert!(context.is_initialised());
        example.draw(&mut context).unwrap();
        let image = context.gpu().unwrap().read_target().unwrap();
        assert_eq!(image.dimensions(), (32, 16));
        assert_eq!(image.get_pixel(31, 15).0, [255, 0, 255, 255]);

        context.resize(48, 20).unwrap();
        context.common_init().unwrap();
        example.draw(&mut context).unwrap();
        let image = context.gpu().unwrap().read_target().unwrap();
        assert_eq!(image.dimensions(), (48, 20));
        assert_eq!(image.get_pixel(47, 19).0, [255, 0, 255, 255]);

        example.quit(&mut context);
        assert!(!context.is_initialised());
    }
}
