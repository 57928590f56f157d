//! Renderer contract.
//!
//! The simulation never draws. Once per frame it fills a [`RenderBuffer`]
//! and hands it to whatever backend the host plugged in.

use super::instance::RenderBuffer;

pub trait Renderer {
    /// Draw one frame's snapshot. Called once per `Simulation::render`.
    fn draw(&mut self, batch: &RenderBuffer);
}

/// Keeps a copy of the last batch. Useful for headless hosts and tests.
#[derive(Debug, Default)]
pub struct CaptureRenderer {
    pub frames: u32,
    pub last: RenderBuffer,
}

impl Renderer for CaptureRenderer {
    fn draw(&mut self, batch: &RenderBuffer) {
        self.frames += 1;
        self.last.instances.clone_from(&batch.instances);
    }
}
