#![cfg(feature = "integration-tests")]

//! Exercises the full flow lifecycle against a live event loop: init runs
//! once, updates track frames, async events arrive after the frame that
//! produced them, and async state mutations all land.

mod common;

use common::test_utils::State;
use marquee::{
    context::Context,
    flow::{FlowConstructor, GraphicsFlow, ImageTestResult, Out},
    render::Render,
};
use wgpu::Color;

enum Event {
    Ping,
}

struct LifecycleProbe;

impl GraphicsFlow<State, Event> for LifecycleProbe {
    fn on_init(&mut self, ctx: &mut Context, state: &mut State) -> Out<State, Event> {
        ctx.clear_colour = Color::TRANSPARENT;
        assert_eq!(state.frame_counter(), 0);
        assert_eq!(state.init_invocations(), 0);
        assert_eq!(state.update_invocations(), 0);

        state.init();
        Out::Empty
    }

    fn on_click(&mut self, _: &Context, state: &mut State, _: u32) -> Out<State, Event> {
        state.click();
        Out::Empty
    }

    fn on_update(
        &mut self,
        _: &Context,
        state: &mut State,
        _: std::time::Duration,
    ) -> Out<State, Event> {
        assert_eq!(state.frame_counter(), state.update_invocations());
        assert_eq!(state.init_invocations(), 1);
        state.frame();
        state.update();

        let first: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
            state.dummy_state.push('a');
        });
        let second: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
            state.dummy_state.push('b');
        });
        match state.frame_counter() {
            3 => Out::FutEvent(vec![Box::new(async move { Event::Ping })]),
            5 => Out::FutFn(vec![
                Box::new(async move { first }),
                Box::new(async move { second }),
            ]),
            x if x > 5 => {
                assert!(state.dummy_state.contains('a'));
                assert!(state.dummy_state.contains('b'));
                assert_eq!(state.dummy_state.len(), 2, "{}", state.dummy_state);
                Out::Empty
            }
            _ => Out::Empty,
        }
    }

    fn on_tick(&mut self, _: &Context, _: &mut State) -> Out<State, Event> {
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &marquee::DeviceEvent,
    ) -> Out<State, Event> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &marquee::WindowEvent,
    ) -> Out<State, Event> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, state: &mut State, _: Event) -> Option<Event> {
        // we send the event in frame 3
        assert!(state.frame_counter() >= 3);
        assert!(state.update_invocations() >= 3);
        None
    }

    fn on_render(&self) -> Render<'_> {
        Render::None
    }

    fn render_to_texture(
        &self,
        _: &Context,
        state: &mut State,
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        // Let the loop run long enough for the async scenarios to resolve
        if state.frame_counter() > 6 {
            Ok(ImageTestResult::Passed)
        } else {
            Ok(ImageTestResult::Waiting)
        }
    }
}

#[test]
fn lifecycle_hooks_fire_in_order() {
    let model_constructor: FlowConstructor<State, Event> = Box::new(|_| {
        Box::pin(async move { Box::new(LifecycleProbe) as Box<dyn GraphicsFlow<_, _>> })
    });

    if let Err(e) = marquee::flow::run(vec![model_constructor]) {
        panic!("{}", e);
    }
}
