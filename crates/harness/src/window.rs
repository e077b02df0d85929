use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::context::{Context, RenderTarget};
use crate::example::{Example, ExampleRegistry};
use crate::runtime::{time_source_for, BoxedTimeSource, FrameScheduler};
use crate::types::HarnessConfig;

/// What a key press asks the runner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Next,
    Previous,
    Left,
    Right,
    Up,
    Down,
    Exit,
}

fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Exit),
        Key::Named(NamedKey::ArrowLeft) => Some(KeyAction::Left),
        Key::Named(NamedKey::ArrowRight) => Some(KeyAction::Right),
        Key::Named(NamedKey::ArrowUp) => Some(KeyAction::Up),
        Key::Named(NamedKey::ArrowDown) => Some(KeyAction::Down),
        Key::Character(value) if value.eq_ignore_ascii_case("d") => Some(KeyAction::Next),
        Key::Character(value) if value.eq_ignore_ascii_case("a") => Some(KeyAction::Previous),
        _ => None,
    }
}

/// The example currently shown in the window plus its context and clock.
struct Session<'a> {
    registry: &'a ExampleRegistry,
    config: &'a HarnessConfig,
    window: Arc<Window>,
    index: usize,
    example: Box<dyn Example>,
    context: Context,
    clock: BoxedTimeSource,
    scheduler: FrameScheduler,
}

impl<'a> Session<'a> {
    fn start(
        registry: &'a ExampleRegistry,
        index: usize,
        config: &'a HarnessConfig,
        window: Arc<Window>,
    ) -> Result<Self> {
        let (example, context) = init_example(registry, index, config, &window)?;
        Ok(Self {
            registry,
            config,
            window,
            index,
            example,
            context,
            clock: time_source_for(config),
            scheduler: FrameScheduler::new(config.target_fps),
        })
    }

    fn switch_to(&mut self, index: usize) -> Result<()> {
        tracing::info!(
            from = self.example.name(),
            to = self.registry.get(index).name,
            "switching example"
        );
        self.example.quit(&mut self.context);
        let (example, context) = init_example(self.registry, index, self.config, &self.window)?;
        self.index = index;
        self.example = example;
        self.context = context;
        self.clock.reset();
        self.scheduler.reset();
        self.window.request_redraw();
        Ok(())
    }

    fn handle_key(&mut self, event: &KeyEvent) -> Result<bool> {
        if event.state != ElementState::Pressed {
            return Ok(true);
        }
        let Some(action) = key_action(&event.logical_key) else {
            return Ok(true);
        };
        match action {
            KeyAction::Exit => return Ok(false),
            KeyAction::Left => self.context.input.left_pressed = true,
            KeyAction::Right => self.context.input.right_pressed = true,
            KeyAction::Up => self.context.input.up_pressed = true,
            KeyAction::Down => self.context.input.down_pressed = true,
            KeyAction::Next if !event.repeat => {
                self.switch_to(self.registry.next_index(self.index))?;
            }
            KeyAction::Previous if !event.repeat => {
                self.switch_to(self.registry.previous_index(self.index))?;
            }
            KeyAction::Next | KeyAction::Previous => {}
        }
        Ok(true)
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Err(err) = self.context.resize(size.width, size.height) {
            tracing::debug!(error = %err, "resize ignored");
        }
        self.window.request_redraw();
    }

    fn frame(&mut self) -> Result<()> {
        self.context.delta_time = self.clock.delta();
        self.example.update(&mut self.context)?;
        self.example.draw(&mut self.context)?;
        self.context.input.clear();
        self.scheduler.mark_rendered(Instant::now());
        if let Ok(gpu) = self.context.gpu_mut() {
            if gpu.reconfigure_if_needed() {
                tracing::debug!("surface reconfigured");
            }
        }
        Ok(())
    }

    fn shutdown(mut self) {
        self.example.quit(&mut self.context);
    }
}

fn init_example(
    registry: &ExampleRegistry,
    index: usize,
    config: &HarnessConfig,
    window: &Arc<Window>,
) -> Result<(Box<dyn Example>, Context)> {
    let entry = registry.get(index);
    let mut example = (entry.build)();
    let mut context = Context::new(entry.name, RenderTarget::Window(window.clone()), config);
    if let Err(err) = example.init(&mut context) {
        example.quit(&mut context);
        return Err(err.context(format!("{}: init failed", entry.name)));
    }
    tracing::info!(example = entry.name, "example running");
    Ok((example, context))
}

/// Opens a window and runs examples until the user quits.
///
/// `D`/`A` cycle through the registry, arrow keys feed [`crate::InputState`]
/// and `Escape` or closing the window exits. The first error returned by an
/// example ends the loop and is returned after that example's `quit` ran.
pub fn run(registry: &ExampleRegistry, start_index: usize, config: &HarnessConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let (width, height) = config.window_size;
    let window = WindowBuilder::new()
        .with_title("gallery")
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        .with_resizable(true)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut session = Some(Session::start(registry, start_index, config, window.clone())?);
    let mut failure: Option<anyhow::Error> = None;
    window.request_redraw();

    let run_result = event_loop.run(|event, elwt| {
        let Some(active) = session.as_mut() else {
            elwt.exit();
            return;
        };

        let outcome = match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => Ok(false),
                WindowEvent::KeyboardInput { event, .. } => active.handle_key(&event),
                WindowEvent::Resized(size) => {
                    active.resize(size);
                    Ok(true)
                }
                WindowEvent::RedrawRequested => active.frame().map(|()| true),
                _ => Ok(true),
            },
            Event::AboutToWait => {
                let now = Instant::now();
                if active.scheduler.ready_for_frame(now) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = active.scheduler.next_deadline() {
                    tracing::trace!(
                        deadline_ms = deadline.saturating_duration_since(now).as_millis(),
                        "waiting for next frame"
                    );
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
                Ok(true)
            }
            _ => Ok(true),
        };

        match outcome {
            Ok(true) => {}
            Ok(false) => {
                if let Some(finished) = session.take() {
                    finished.shutdown();
                }
                elwt.exit();
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "example failed; exiting");
                if let Some(finished) = session.take() {
                    finished.shutdown();
                }
                failure = Some(err);
                elwt.exit();
            }
        }
    });

    if let Some(remaining) = session.take() {
        remaining.shutdown();
    }
    if let Some(err) = failure {
        return Err(err);
    }
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(
            key_action(&Key::Named(NamedKey::Escape)),
            Some(KeyAction::Exit)
        );
        assert_eq!(
            key_action(&Key::Named(NamedKey::ArrowUp)),
            Some(KeyAction::Up)
        );
        assert_eq!(
            key_action(&Key::Character("d".into())),
            Some(KeyAction::Next)
        );
        assert_eq!(
            key_action(&Key::Character("A".into())),
            Some(KeyAction::Previous)
        );
        assert_eq!(key_action(&Key::Character("x".into())), None);
        assert_eq!(key_action(&Key::Named(NamedKey::Space)), None);
    }
}
