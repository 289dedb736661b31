#![cfg(feature = "integration-tests")]

//! Renders an empty scene and checks that the frame comes out as the default
//! light-brown clear colour: every pixel identical, opaque, and not grey.

mod common;

use common::test_utils::{FrameCounter, TestRender};
use marquee::{
    context::{Context, DEFAULT_CLEAR_COLOUR},
    flow::ImageTestResult,
    render::Render,
};

#[test]
fn empty_scene_clears_to_the_default_background() {
    golden_image_test!(TestRender {
        setup: Box::new(|ctx: &mut Context, _: &mut FrameCounter| {
            ctx.clear_colour = DEFAULT_CLEAR_COLOUR;
        }),
        render: Render::None,
        validate: Box::new(|_, state: &mut FrameCounter, texture| {
            if state.frame() == 0 {
                return Ok(ImageTestResult::Waiting);
            }
            let mut pixels = texture.pixels();
            let first = *pixels.next().expect("empty output image");
            // Opaque, and a real colour (the channels differ), so the scene
            // was cleared rather than left black or white.
            assert_eq!(first.0[3], 255);
            let rgb = &first.0[..3];
            assert!(rgb.iter().all(|&c| c > 0 && c < 255), "{:?}", first);
            assert_ne!(rgb.iter().min(), rgb.iter().max(), "{:?}", first);
            for pixel in pixels {
                assert_eq!(*pixel, first);
            }
            Ok(ImageTestResult::Passed)
        }),
    });
}
