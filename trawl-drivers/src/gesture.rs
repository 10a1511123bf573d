//! Synthetic touch input.
//!
//! Sequences are planned as plain data ([`TouchSequence`]) and only then
//! handed to the session, which keeps the geometry testable without a device.
//! None of these calls wait for the UI to finish animating; callers that
//! depend on a settled screen pause on their own.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;
use trawl_common::Result;

use crate::session::{ElementId, MobileSession, WindowSize};

/// Default hold time between press and move for swipes.
pub const DEFAULT_SWIPE_DURATION: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchStep {
    MoveTo { x: i64, y: i64, duration: Duration },
    Down,
    Pause(Duration),
    Up,
}

/// One pointer's worth of touch steps at absolute viewport coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TouchSequence {
    steps: Vec<TouchStep>,
}

impl TouchSequence {
    pub fn tap(x: i64, y: i64) -> Self {
        Self {
            steps: vec![
                TouchStep::MoveTo {
                    x,
                    y,
                    duration: Duration::ZERO,
                },
                TouchStep::Down,
                TouchStep::Up,
            ],
        }
    }

    /// Press at `from`, hold for `hold`, move to `to`, release.
    pub fn swipe(from: (i64, i64), to: (i64, i64), hold: Duration) -> Self {
        Self {
            steps: vec![
                TouchStep::MoveTo {
                    x: from.0,
                    y: from.1,
                    duration: Duration::ZERO,
                },
                TouchStep::Down,
                TouchStep::Pause(hold),
                TouchStep::MoveTo {
                    x: to.0,
                    y: to.1,
                    duration: Duration::ZERO,
                },
                TouchStep::Up,
            ],
        }
    }

    pub fn steps(&self) -> &[TouchStep] {
        &self.steps
    }

    /// W3C `POST /actions` body for a single touch pointer.
    pub fn to_w3c_actions(&self) -> Value {
        let actions: Vec<Value> = self
            .steps
            .iter()
            .map(|step| match *step {
                TouchStep::MoveTo { x, y, duration } => json!({
                    "type": "pointerMove",
                    "duration": duration.as_millis() as u64,
                    "origin": "viewport",
                    "x": x,
                    "y": y,
                }),
                TouchStep::Down => json!({ "type": "pointerDown", "button": 0 }),
                TouchStep::Pause(d) => json!({ "type": "pause", "duration": d.as_millis() as u64 }),
                TouchStep::Up => json!({ "type": "pointerUp", "button": 0 }),
            })
            .collect();

        json!({
            "actions": [{
                "type": "pointer",
                "id": "finger1",
                "parameters": { "pointerType": "touch" },
                "actions": actions,
            }]
        })
    }
}

/// Vertical swipe along the horizontal center, expressed as fractions of
/// the window height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeSpan {
    pub start_fraction: f64,
    pub end_fraction: f64,
    pub duration: Duration,
}

impl Default for SwipeSpan {
    fn default() -> Self {
        Self {
            start_fraction: 0.8,
            end_fraction: 0.2,
            duration: DEFAULT_SWIPE_DURATION,
        }
    }
}

impl SwipeSpan {
    pub fn new(start_fraction: f64, end_fraction: f64, duration: Duration) -> Self {
        Self {
            start_fraction,
            end_fraction,
            duration,
        }
    }

    pub fn reversed(self) -> Self {
        Self {
            start_fraction: self.end_fraction,
            end_fraction: self.start_fraction,
            duration: self.duration,
        }
    }
}

/// Plan a swipe for `span` on a window of `size`.
///
/// ```
/// use trawl_drivers::gesture::{vertical_swipe, SwipeSpan, TouchSequence};
/// use trawl_drivers::WindowSize;
/// use std::time::Duration;
///
/// let size = WindowSize { width: 1080, height: 2400 };
/// let seq = vertical_swipe(size, SwipeSpan::default());
/// assert_eq!(seq, TouchSequence::swipe((540, 1920), (540, 480), Duration::from_millis(800)));
/// ```
pub fn vertical_swipe(size: WindowSize, span: SwipeSpan) -> TouchSequence {
    let x = (f64::from(size.width) * 0.5).round() as i64;
    let y1 = (f64::from(size.height) * span.start_fraction).round() as i64;
    let y2 = (f64::from(size.height) * span.end_fraction).round() as i64;
    TouchSequence::swipe((x, y1), (x, y2), span.duration)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

/// What the native scroll gesture reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    Moved,
    /// The driver reported nothing left to scroll; usually the end of content.
    NoMovement,
}

/// Issues gestures against a shared session.
#[derive(Clone)]
pub struct GestureEngine {
    session: Arc<dyn MobileSession>,
}

impl GestureEngine {
    pub fn new(session: Arc<dyn MobileSession>) -> Self {
        Self { session }
    }

    pub async fn tap(&self, x: i64, y: i64) -> Result<()> {
        debug!(target: "trawl.gesture", x, y, "tap");
        self.session.perform_touch(&TouchSequence::tap(x, y)).await
    }

    pub async fn swipe(
        &self,
        from: (i64, i64),
        to: (i64, i64),
        duration: Duration,
    ) -> Result<()> {
        debug!(target: "trawl.gesture", ?from, ?to, ?duration, "swipe");
        self.session
            .perform_touch(&TouchSequence::swipe(from, to, duration))
            .await
    }

    /// Swipe from `height * start` to `height * end` along the center line.
    pub async fn swipe_up(&self, span: SwipeSpan) -> Result<()> {
        let size = self.session.window_size().await?;
        let seq = vertical_swipe(size, span);
        debug!(target: "trawl.gesture", ?span, "swipe up");
        self.session.perform_touch(&seq).await
    }

    /// [`swipe_up`](Self::swipe_up) over the same span, travelling the
    /// other way.
    pub async fn swipe_down(&self, span: SwipeSpan) -> Result<()> {
        self.swipe_up(span.reversed()).await
    }

    /// Appium's native `mobile: scrollGesture`, scoped to `element`.
    pub async fn scroll_element(
        &self,
        element: &ElementId,
        direction: ScrollDirection,
        percent: f64,
    ) -> Result<ScrollOutcome> {
        let result = self
            .session
            .execute_mobile(
                "mobile: scrollGesture",
                json!({
                    "elementId": element.as_str(),
                    "direction": direction.as_str(),
                    "percent": percent,
                }),
            )
            .await?;
        let moved = result.as_bool().unwrap_or(false);
        debug!(target: "trawl.gesture", %element, direction = direction.as_str(), percent, moved, "scroll gesture");
        Ok(if moved {
            ScrollOutcome::Moved
        } else {
            ScrollOutcome::NoMovement
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockSession};

    fn engine(mock: &Arc<MockSession>) -> GestureEngine {
        GestureEngine::new(mock.clone())
    }

    fn touches(mock: &MockSession) -> Vec<TouchSequence> {
        mock.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Touch(seq) => Some(seq),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn swipe_down_is_swipe_up_with_fractions_reversed() {
        let up_mock = Arc::new(MockSession::new().with_window(720, 1600));
        let down_mock = Arc::new(MockSession::new().with_window(720, 1600));
        let d = Duration::from_millis(350);

        engine(&down_mock)
            .swipe_down(SwipeSpan::new(0.3, 0.9, d))
            .await
            .unwrap();
        engine(&up_mock)
            .swipe_up(SwipeSpan::new(0.9, 0.3, d))
            .await
            .unwrap();

        let down = touches(&down_mock);
        assert_eq!(down, touches(&up_mock));
        assert_eq!(
            down,
            vec![TouchSequence::swipe((360, 1440), (360, 480), d)]
        );
    }

    #[tokio::test]
    async fn default_swipe_up_travels_from_80_to_20_percent() {
        let mock = Arc::new(MockSession::new().with_window(1000, 2000));
        engine(&mock).swipe_up(SwipeSpan::default()).await.unwrap();
        assert_eq!(
            touches(&mock),
            vec![TouchSequence::swipe(
                (500, 1600),
                (500, 400),
                DEFAULT_SWIPE_DURATION
            )]
        );
    }

    #[tokio::test]
    async fn scroll_element_maps_driver_result() {
        let mock = Arc::new(MockSession::new().with_scroll_results([true, false]));
        let container = ElementId::new("list");
        let g = engine(&mock);

        assert_eq!(
            g.scroll_element(&container, ScrollDirection::Up, 0.6)
                .await
                .unwrap(),
            ScrollOutcome::Moved
        );
        assert_eq!(
            g.scroll_element(&container, ScrollDirection::Up, 0.6)
                .await
                .unwrap(),
            ScrollOutcome::NoMovement
        );

        let calls = mock.calls();
        let Call::Mobile(name, args) = &calls[0] else {
            panic!("expected a mobile command, got {:?}", calls[0]);
        };
        assert_eq!(name, "mobile: scrollGesture");
        assert_eq!(
            args,
            &json!({ "elementId": "list", "direction": "up", "percent": 0.6 })
        );
    }

    #[test]
    fn tap_serializes_to_w3c_pointer_actions() {
        let body = TouchSequence::tap(10, 20).to_w3c_actions();
        let pointer = &body["actions"][0];
        assert_eq!(pointer["type"], "pointer");
        assert_eq!(pointer["parameters"]["pointerType"], "touch");
        let steps = pointer["actions"].as_array().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0]["type"], "pointerMove");
        assert_eq!(steps[0]["x"], 10);
        assert_eq!(steps[0]["y"], 20);
        assert_eq!(steps[1]["type"], "pointerDown");
        assert_eq!(steps[2]["type"], "pointerUp");
    }

    #[test]
    fn swipe_holds_before_moving() {
        let body = TouchSequence::swipe((1, 2), (3, 4), Duration::from_millis(800)).to_w3c_actions();
        let steps = body["actions"][0]["actions"].as_array().unwrap();
        let kinds: Vec<&str> = steps.iter().map(|s| s["type"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            ["pointerMove", "pointerDown", "pause", "pointerMove", "pointerUp"]
        );
        assert_eq!(steps[2]["duration"], 800);
    }
}
