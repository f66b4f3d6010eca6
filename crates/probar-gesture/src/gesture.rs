//! Gesture simulation pipeline: resolve endpoints, generate the path,
//! play it back (and optionally render it).
//!
//! Every endpoint is resolved before the first event is dispatched, so a
//! missing element aborts the gesture without a partial event sequence.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::dom::{Dom, ElementId};
use crate::geometry::{Anchor, Point};
use crate::harness::{GestureKind, SimulationConfig, TestCase, VisualizationConfig};
use crate::path::{curved_path, hover_path, HoverPath, Path};
use crate::resolver::{PointResolver, PointTarget, TargetRole};
use crate::result::{GestureError, GestureResult};
use crate::synthesizer::EventSynthesizer;

/// Renders a gesture path, e.g. an on-page overlay with an animated cursor.
///
/// `replay` runs concurrently with event playback and the gesture is not
/// complete until both finish.
#[async_trait]
pub trait PathVisualizer: Send + Sync {
    /// Render `path`, advancing one point every `frame_delay`
    async fn replay(
        &self,
        path: &Path,
        frame_delay: Duration,
        config: &VisualizationConfig,
    ) -> GestureResult<()>;
}

/// Runs the resolve, generate, play pipeline for one test
#[derive(Clone)]
pub struct GestureSimulator {
    config: RunnerConfig,
    visualizer: Option<Arc<dyn PathVisualizer>>,
}

impl std::fmt::Debug for GestureSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureSimulator")
            .field("config", &self.config)
            .field("visualizer", &self.visualizer.is_some())
            .finish()
    }
}

enum Planned {
    Drag {
        path: Path,
        resolver: PointResolver,
    },
    Hover {
        hover: HoverPath,
        target: Option<ElementId>,
        hold: Duration,
    },
}

impl GestureSimulator {
    /// Create a simulator
    #[must_use]
    pub fn new(config: RunnerConfig, visualizer: Option<Arc<dyn PathVisualizer>>) -> Self {
        Self { config, visualizer }
    }

    /// Runner settings in use
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Simulate a test's gesture. Returns the generated path, or `None` for
    /// custom tests.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is missing or unresolvable, or the DOM
    /// rejects an event
    pub async fn simulate(&self, dom: &dyn Dom, test: &TestCase) -> GestureResult<Option<Path>> {
        let planned = match test.kind {
            GestureKind::Custom => return Ok(None),
            GestureKind::Drag => self.plan_drag(dom, &test.simulation).await?,
            GestureKind::Click => self.plan_click(dom, &test.simulation).await?,
            GestureKind::Hover => self.plan_hover(dom, &test.simulation).await?,
        };

        let synth = EventSynthesizer::from_config(&self.config);
        let dispatch = test.simulation.dispatch_events;
        let visual = self.visual_config(test);

        let path = match planned {
            Planned::Drag { path, resolver } => {
                let playback = async {
                    if dispatch {
                        synth
                            .play_drag(
                                dom,
                                &path,
                                resolver.element_for(TargetRole::Start),
                                resolver.element_for(TargetRole::End),
                            )
                            .await
                            .map(|_| ())
                    } else {
                        Ok(())
                    }
                };
                self.with_visualization(&path, &synth, visual.as_ref(), playback)
                    .await?;
                path
            }
            Planned::Hover {
                hover,
                target,
                hold,
            } => {
                let combined = hover.combined();
                let playback = async {
                    if dispatch {
                        synth
                            .play_hover(dom, &hover, target.as_ref(), hold)
                            .await
                            .map(|_| ())
                    } else {
                        Ok(())
                    }
                };
                self.with_visualization(&combined, &synth, visual.as_ref(), playback)
                    .await?;
                combined
            }
        };

        tracing::debug!(test = %test.name, kind = %test.kind, points = path.len(), dispatch, "gesture simulated");
        Ok(Some(path))
    }

    fn visual_config(&self, test: &TestCase) -> Option<VisualizationConfig> {
        self.visualizer.as_ref()?;
        match &test.visualization {
            Some(config) => Some(config.clone()),
            None if self.config.visualize => Some(VisualizationConfig::default()),
            None => None,
        }
    }

    async fn with_visualization<F>(
        &self,
        path: &Path,
        synth: &EventSynthesizer,
        visual: Option<&VisualizationConfig>,
        playback: F,
    ) -> GestureResult<()>
    where
        F: std::future::Future<Output = GestureResult<()>> + Send,
    {
        let (Some(visualizer), Some(visual)) = (self.visualizer.as_ref(), visual) else {
            return playback.await;
        };
        let (played, rendered) =
            futures::join!(playback, visualizer.replay(path, synth.frame_delay(), visual));
        if let Err(e) = rendered {
            tracing::warn!(error = %e, "path visualization failed");
        }
        played
    }

    async fn plan_drag(&self, dom: &dyn Dom, sim: &SimulationConfig) -> GestureResult<Planned> {
        let from = required(sim.from.as_ref(), "from")?;
        let to = required(sim.to.as_ref(), "to")?;
        let mut resolver = PointResolver::new(self.config.handle_selector.clone());
        let start = resolver
            .resolve(dom, from, sim.from_anchor, TargetRole::Start)
            .await?;
        let end = resolver
            .resolve(dom, to, sim.to_anchor, TargetRole::End)
            .await?;

        if sim.dispatch_events {
            let pressed = resolver.element_for(TargetRole::Start);
            settle(dom, pressed, start).await?;
            settle(dom, resolver.element_for(TargetRole::End).or(pressed), end).await?;
        }

        let path = curved_path(
            start,
            end,
            sim.duration_ms.unwrap_or(self.config.default_duration_ms),
            self.config.fps,
            sim.curvature.unwrap_or(self.config.default_curvature),
        );
        Ok(Planned::Drag { path, resolver })
    }

    async fn plan_click(&self, dom: &dyn Dom, sim: &SimulationConfig) -> GestureResult<Planned> {
        let (target, anchor) = match (&sim.to, &sim.from) {
            (Some(to), _) => (to, sim.to_anchor),
            (None, Some(from)) => (from, sim.from_anchor),
            (None, None) => return Err(missing("to")),
        };
        let mut resolver = PointResolver::new(self.config.handle_selector.clone());
        let point = resolver
            .resolve(dom, target, anchor, TargetRole::Start)
            .await?;
        let _ = resolver
            .resolve(dom, target, anchor, TargetRole::End)
            .await?;

        let path = curved_path(
            point,
            point,
            self.config.click_duration_ms,
            self.config.fps,
            sim.curvature.unwrap_or(self.config.default_curvature),
        );
        Ok(Planned::Drag { path, resolver })
    }

    async fn plan_hover(&self, dom: &dyn Dom, sim: &SimulationConfig) -> GestureResult<Planned> {
        let from = required(sim.from.as_ref(), "from")?;
        let to = required(sim.to.as_ref(), "to")?;
        let mut resolver = PointResolver::new(self.config.handle_selector.clone());

        let exit = match &sim.leave_to {
            Some(leave_to) => Some(
                resolve_point(&mut resolver, dom, leave_to, sim.from_anchor).await?,
            ),
            None => None,
        };
        let start = resolver
            .resolve(dom, from, sim.from_anchor, TargetRole::Start)
            .await?;
        let target = resolver
            .resolve(dom, to, sim.to_anchor, TargetRole::End)
            .await?;

        let hovered = if sim.dispatch_events {
            Some(settle(dom, resolver.element_for(TargetRole::End), target).await?)
        } else {
            None
        };

        let timing = &sim.hover;
        let hover = hover_path(
            start,
            target,
            exit.unwrap_or(start),
            timing.approach_ms.unwrap_or(self.config.hover_approach_ms),
            timing.departure_ms.unwrap_or(self.config.hover_departure_ms),
            self.config.fps,
        );
        Ok(Planned::Hover {
            hover,
            target: hovered,
            hold: Duration::from_millis(timing.hold_ms.unwrap_or(self.config.hover_hold_ms)),
        })
    }
}

async fn resolve_point(
    resolver: &mut PointResolver,
    dom: &dyn Dom,
    target: &PointTarget,
    anchor: Anchor,
) -> GestureResult<Point> {
    // Only the coordinate matters; the start role is overwritten afterwards
    resolver.resolve(dom, target, anchor, TargetRole::Start).await
}

// The element an event at `point` goes to: the recorded one, else whatever
// is under the point.
async fn settle(
    dom: &dyn Dom,
    element: Option<&ElementId>,
    point: Point,
) -> GestureResult<ElementId> {
    match element {
        Some(element) => Ok(element.clone()),
        None => dom
            .element_from_point(point)
            .await?
            .ok_or_else(|| GestureError::element_not_found(point.to_string())),
    }
}

fn required<'a>(target: Option<&'a PointTarget>, field: &str) -> GestureResult<&'a PointTarget> {
    target.ok_or_else(|| missing(field))
}

fn missing(field: &str) -> GestureError {
    GestureError::invalid_config(format!("simulation.{field} is required"))
}
