//! Event Synthesizer
//!
//! Plays a sampled path back as synthetic pointer events, one per frame,
//! with a fixed inter-frame delay of `1000 / fps` ms scaled by the
//! slow-motion factor.
//!
//! Event targeting:
//!
//! | event | target |
//! |---|---|
//! | press | start element, else element under the point |
//! | move | element under the point, else start element |
//! | release, click | end element, else start element, else element under the point |
//! | enter, over, leave, out | hover target, else element under the point |

use std::time::Duration;

use crate::config::RunnerConfig;
use crate::dom::{Dom, ElementId};
use crate::event::{PointerEventKind, SyntheticEvent, PRIMARY_BUTTON_MASK};
use crate::geometry::Point;
use crate::path::{HoverPath, Path};
use crate::result::{GestureError, GestureResult};

/// Counters describing one playback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Playback {
    /// Events dispatched
    pub dispatched: usize,
    /// Moves dropped because nothing was under the pointer
    pub skipped: usize,
}

/// Dispatches synthetic pointer events along a path
#[derive(Debug, Clone, PartialEq)]
pub struct EventSynthesizer {
    fps: u32,
    slow_motion: f64,
    screen_offset: Point,
}

impl Default for EventSynthesizer {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl EventSynthesizer {
    /// Create a synthesizer for a frame rate
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            slow_motion: 1.0,
            screen_offset: Point::default(),
        }
    }

    /// Create a synthesizer from runner settings
    #[must_use]
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            fps: config.fps,
            slow_motion: config.slow_motion,
            screen_offset: config.screen_offset,
        }
    }

    /// Set the slow-motion factor
    #[must_use]
    pub fn with_slow_motion(mut self, factor: f64) -> Self {
        self.slow_motion = factor;
        self
    }

    /// Set the client-to-screen offset
    #[must_use]
    pub fn with_screen_offset(mut self, offset: Point) -> Self {
        self.screen_offset = offset;
        self
    }

    /// Delay between consecutive frames
    #[must_use]
    pub fn frame_delay(&self) -> Duration {
        if self.fps == 0 {
            return Duration::ZERO;
        }
        let factor = if self.slow_motion.is_finite() && self.slow_motion > 0.0 {
            self.slow_motion
        } else {
            1.0
        };
        Duration::try_from_secs_f64(factor / f64::from(self.fps)).unwrap_or(Duration::MAX)
    }

    /// Play a press-move-release-click gesture.
    ///
    /// Press and release targets are settled before anything is dispatched.
    /// `click` is dispatched immediately after `release`, with no frame
    /// delay between them.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, no press or release target can
    /// be found, or the DOM rejects a dispatch
    pub async fn play_drag(
        &self,
        dom: &dyn Dom,
        path: &Path,
        start: Option<&ElementId>,
        end: Option<&ElementId>,
    ) -> GestureResult<Playback> {
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return Err(GestureError::InvalidState {
                message: "cannot play an empty path".to_string(),
            });
        };
        let mut stats = Playback::default();
        tracing::debug!(points = path.len(), from = %first, to = %last, "playing drag");

        let press_target = match start {
            Some(element) => element.clone(),
            None => hit(dom, first).await?,
        };
        let release_target = match end.or(start) {
            Some(element) => element.clone(),
            None => hit(dom, last).await?,
        };
        self.send(dom, &press_target, PointerEventKind::Press, first, PRIMARY_BUTTON_MASK)
            .await?;
        stats.dispatched += 1;

        for point in path.intermediate() {
            self.wait_frame().await;
            let target = match dom.element_from_point(*point).await? {
                Some(element) => Some(element),
                None => start.cloned(),
            };
            match target {
                Some(element) => {
                    self.send(dom, &element, PointerEventKind::Move, *point, PRIMARY_BUTTON_MASK)
                        .await?;
                    stats.dispatched += 1;
                }
                None => stats.skipped += 1,
            }
        }

        self.wait_frame().await;
        self.send(dom, &release_target, PointerEventKind::Release, last, 0)
            .await?;
        self.send(dom, &release_target, PointerEventKind::Click, last, 0)
            .await?;
        stats.dispatched += 2;

        Ok(stats)
    }

    /// Play a hover: approach moves, enter and over on the target, hold,
    /// leave and out, then departure moves. No button is held throughout.
    ///
    /// # Errors
    ///
    /// Returns an error if no hover target can be found or the DOM rejects a
    /// dispatch
    pub async fn play_hover(
        &self,
        dom: &dyn Dom,
        hover: &HoverPath,
        target: Option<&ElementId>,
        hold: Duration,
    ) -> GestureResult<Playback> {
        let Some(arrival) = hover.approach.last() else {
            return Err(GestureError::InvalidState {
                message: "cannot play an empty hover approach".to_string(),
            });
        };
        let mut stats = Playback::default();
        tracing::debug!(
            approach = hover.approach.len(),
            departure = hover.departure.len(),
            at = %arrival,
            "playing hover"
        );

        let hovered = match target {
            Some(element) => element.clone(),
            None => hit(dom, arrival).await?,
        };

        let approach = &hover.approach.points()[..hover.approach.len() - 1];
        for (i, point) in approach.iter().enumerate() {
            if i > 0 {
                self.wait_frame().await;
            }
            self.move_over(dom, *point, &mut stats).await?;
        }
        if !approach.is_empty() {
            self.wait_frame().await;
        }

        self.send(dom, &hovered, PointerEventKind::Enter, arrival, 0)
            .await?;
        self.send(dom, &hovered, PointerEventKind::Over, arrival, 0)
            .await?;
        stats.dispatched += 2;

        tokio::time::sleep(hold).await;

        self.send(dom, &hovered, PointerEventKind::Leave, arrival, 0)
            .await?;
        self.send(dom, &hovered, PointerEventKind::Out, arrival, 0)
            .await?;
        stats.dispatched += 2;

        for point in hover.departure.points().iter().skip(1) {
            self.wait_frame().await;
            self.move_over(dom, *point, &mut stats).await?;
        }

        Ok(stats)
    }

    async fn move_over(&self, dom: &dyn Dom, point: Point, stats: &mut Playback) -> GestureResult<()> {
        match dom.element_from_point(point).await? {
            Some(element) => {
                self.send(dom, &element, PointerEventKind::Move, point, 0)
                    .await?;
                stats.dispatched += 1;
            }
            None => stats.skipped += 1,
        }
        Ok(())
    }

    async fn send(
        &self,
        dom: &dyn Dom,
        target: &ElementId,
        kind: PointerEventKind,
        point: Point,
        buttons: u16,
    ) -> GestureResult<()> {
        let event = SyntheticEvent::new(kind, point, self.screen_offset, buttons);
        dom.dispatch(target, &event).await
    }

    async fn wait_frame(&self) {
        let delay = self.frame_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

async fn hit(dom: &dyn Dom, point: Point) -> GestureResult<ElementId> {
    dom.element_from_point(point)
        .await?
        .ok_or_else(|| GestureError::element_not_found(point.to_string()))
}
