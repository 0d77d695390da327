// Per-frame protocol bookkeeping
//
// Idle -> Acquired -> (Recorded) -> Idle. Backend-independent so the ordering
// rules are enforced the same way whatever does the GPU work.

use super::error::{RendererError, Result};

/// Single frame in flight: one set of sync objects, no double buffering.
pub const FRAMES_IN_FLIGHT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    #[default]
    Idle,
    /// Swapchain image acquired, command buffer reset, nothing recorded yet
    Acquired { image_index: u32 },
    /// The frame's single draw has been recorded
    Recorded { image_index: u32 },
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    phase: FramePhase,
    frame_index: usize,
    frames_presented: u64,
}

impl FrameLoop {
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Index of the sync slot in use (always 0 with one frame in flight)
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// `begin_frame` is only legal between frames. Does not change state.
    pub fn check_begin(&self) -> Result<()> {
        match self.phase {
            FramePhase::Idle => Ok(()),
            found => Err(RendererError::FrameProtocol {
                operation: "begin_frame",
                expected: "Idle",
                found,
            }),
        }
    }

    pub fn acquired(&mut self, image_index: u32) -> Result<()> {
        self.check_begin()?;
        self.phase = FramePhase::Acquired { image_index };
        Ok(())
    }

    /// Enter recording; returns the swapchain image to record for.
    pub fn record(&mut self) -> Result<u32> {
        match self.phase {
            FramePhase::Acquired { image_index } => {
                self.phase = FramePhase::Recorded { image_index };
                Ok(image_index)
            }
            found => Err(RendererError::FrameProtocol {
                operation: "draw_triangle",
                expected: "Acquired",
                found,
            }),
        }
    }

    /// Leave the frame for submission. Returns the image index and whether
    /// anything was recorded.
    pub fn finish(&mut self) -> Result<(u32, bool)> {
        let finished = match self.phase {
            FramePhase::Acquired { image_index } => (image_index, false),
            FramePhase::Recorded { image_index } => (image_index, true),
            found => {
                return Err(RendererError::FrameProtocol {
                    operation: "end_frame",
                    expected: "Acquired or Recorded",
                    found,
                })
            }
        };

        self.phase = FramePhase::Idle;
        self.frame_index = (self.frame_index + 1) % FRAMES_IN_FLIGHT;
        Ok(finished)
    }

    pub fn presented(&mut self) {
        self.frames_presented += 1;
    }

    /// Drop any half-finished frame (shutdown, swapchain teardown)
    pub fn reset(&mut self) {
        self.phase = FramePhase::Idle;
        self.frame_index = 0;
    }
}
