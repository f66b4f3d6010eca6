//! Chromium Backend (`browser` feature)
//!
//! [`CdpDom`] implements [`Dom`] over a chromiumoxide page by evaluating
//! small scripts. Elements are tagged with a `data-probar-gesture-ref`
//! attribute the first time they are returned, and that tag is the
//! [`ElementId`] key. [`CdpVisualizer`] draws gesture paths as an SVG
//! overlay on the same page.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::dom::{Dom, ElementId};
use crate::event::SyntheticEvent;
use crate::geometry::{BoundingBox, Point};
use crate::gesture::PathVisualizer;
use crate::harness::VisualizationConfig;
use crate::path::Path;
use crate::result::{GestureError, GestureResult};

/// Attribute holding an element's reference key
pub const REF_ATTRIBUTE: &str = "data-probar-gesture-ref";

const OVERLAY_ID: &str = "__probar_gesture_overlay";

const PRELUDE: &str = r#"
const __w = window;
__w.__pgSeq = __w.__pgSeq || 0;
__w.__pgRef = __w.__pgRef || ((el) => {
  if (!el) return null;
  let r = el.getAttribute("data-probar-gesture-ref");
  if (!r) { r = "pg" + (++__w.__pgSeq); el.setAttribute("data-probar-gesture-ref", r); }
  return r;
});
__w.__pgEl = __w.__pgEl || ((r) => {
  const el = document.querySelector('[data-probar-gesture-ref="' + r + '"]');
  if (!el) throw new Error("stale element reference " + r);
  return el;
});
"#;

// Wraps `body` so the result crosses CDP as a JSON string.
fn script(body: &str) -> String {
    format!("(() => {{ {PRELUDE} return JSON.stringify((() => {{ {body} }})()); }})()")
}

fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn dispatch_body(target: &ElementId, event: &SyntheticEvent) -> String {
    format!(
        "const el = __pgEl({target});
         el.dispatchEvent(new MouseEvent({kind}, {{
           bubbles: {bubbles}, cancelable: {cancelable}, view: window,
           clientX: {cx}, clientY: {cy}, screenX: {sx}, screenY: {sy},
           button: {button}, buttons: {buttons}
         }}));
         return true;",
        target = js_str(target.as_str()),
        kind = js_str(event.kind.dom_type()),
        bubbles = event.bubbles,
        cancelable = event.cancelable,
        cx = event.client.x,
        cy = event.client.y,
        sx = event.screen.x,
        sy = event.screen.y,
        button = event.button,
        buttons = event.buttons,
    )
}

/// [`Dom`] backed by a live Chromium page
#[derive(Debug, Clone)]
pub struct CdpDom {
    page: Arc<Mutex<Page>>,
}

impl CdpDom {
    /// Wrap a page
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self::from_shared(Arc::new(Mutex::new(page)))
    }

    /// Wrap a page shared with other owners
    #[must_use]
    pub fn from_shared(page: Arc<Mutex<Page>>) -> Self {
        Self { page }
    }

    /// The underlying page
    #[must_use]
    pub fn page(&self) -> Arc<Mutex<Page>> {
        Arc::clone(&self.page)
    }

    /// Navigate to a URL
    ///
    /// # Errors
    ///
    /// Returns `Dom` if navigation fails
    pub async fn goto(&self, url: &str) -> GestureResult<()> {
        let page = self.page.lock().await;
        page.goto(url)
            .await
            .map_err(|e| GestureError::dom(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, body: &str) -> GestureResult<T> {
        let page = self.page.lock().await;
        let result = page
            .evaluate(script(body))
            .await
            .map_err(|e| GestureError::dom(e.to_string()))?;
        let json: String = result
            .into_value()
            .map_err(|e| GestureError::dom(e.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[async_trait]
impl Dom for CdpDom {
    async fn query_selector(&self, selector: &str) -> GestureResult<Option<ElementId>> {
        let key: Option<String> = self
            .eval(&format!(
                "return __pgRef(document.querySelector({}));",
                js_str(selector)
            ))
            .await?;
        Ok(key.map(ElementId::new))
    }

    async fn query_selector_within(
        &self,
        scope: &ElementId,
        selector: &str,
    ) -> GestureResult<Option<ElementId>> {
        let key: Option<String> = self
            .eval(&format!(
                "return __pgRef(__pgEl({}).querySelector({}));",
                js_str(scope.as_str()),
                js_str(selector)
            ))
            .await?;
        Ok(key.map(ElementId::new))
    }

    async fn count(&self, selector: &str) -> GestureResult<usize> {
        self.eval(&format!(
            "return document.querySelectorAll({}).length;",
            js_str(selector)
        ))
        .await
    }

    async fn bounding_box(&self, element: &ElementId) -> GestureResult<BoundingBox> {
        self.eval(&format!(
            "const r = __pgEl({}).getBoundingClientRect();
             return {{ x: r.left, y: r.top, width: r.width, height: r.height }};",
            js_str(element.as_str())
        ))
        .await
    }

    async fn element_from_point(&self, point: Point) -> GestureResult<Option<ElementId>> {
        let key: Option<String> = self
            .eval(&format!(
                "return __pgRef(document.elementFromPoint({}, {}));",
                point.x, point.y
            ))
            .await?;
        Ok(key.map(ElementId::new))
    }

    async fn has_class(&self, element: &ElementId, class: &str) -> GestureResult<bool> {
        self.eval(&format!(
            "return __pgEl({}).classList.contains({});",
            js_str(element.as_str()),
            js_str(class)
        ))
        .await
    }

    async fn text_content(&self, element: &ElementId) -> GestureResult<String> {
        self.eval(&format!(
            "return __pgEl({}).textContent || \"\";",
            js_str(element.as_str())
        ))
        .await
    }

    async fn dispatch(&self, target: &ElementId, event: &SyntheticEvent) -> GestureResult<()> {
        tracing::trace!(target = %target, kind = event.kind.dom_type(), at = %event.client, "cdp dispatch");
        let _: bool = self.eval(&dispatch_body(target, event)).await?;
        Ok(())
    }
}

/// Draws gesture paths on the page as an SVG overlay
#[derive(Debug, Clone)]
pub struct CdpVisualizer {
    dom: CdpDom,
}

impl CdpVisualizer {
    /// Draw on the page behind `dom`
    #[must_use]
    pub fn new(dom: CdpDom) -> Self {
        Self { dom }
    }
}

fn overlay_body(path: &Path, config: &VisualizationConfig) -> String {
    let points = path
        .points()
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    let color = config.color.as_deref().unwrap_or("#e91e63");
    format!(
        "document.getElementById({id})?.remove();
         const ns = \"http://www.w3.org/2000/svg\";
         const svg = document.createElementNS(ns, \"svg\");
         svg.id = {id};
         svg.setAttribute(\"style\", \"position:fixed;inset:0;width:100vw;height:100vh;pointer-events:none;z-index:2147483647\");
         if ({show_path}) {{
           const line = document.createElementNS(ns, \"polyline\");
           line.setAttribute(\"points\", {points});
           line.setAttribute(\"fill\", \"none\");
           line.setAttribute(\"stroke\", {color});
           line.setAttribute(\"stroke-width\", \"2\");
           svg.appendChild(line);
         }}
         const dot = document.createElementNS(ns, \"circle\");
         dot.setAttribute(\"r\", \"6\");
         dot.setAttribute(\"fill\", {color});
         dot.style.display = {display};
         svg.appendChild(dot);
         document.body.appendChild(svg);
         return true;",
        id = js_str(OVERLAY_ID),
        show_path = config.show_path,
        points = js_str(&points),
        color = js_str(color),
        display = js_str(if config.show_cursor { "inline" } else { "none" }),
    )
}

fn cursor_body(point: Point) -> String {
    format!(
        "const dot = document.querySelector({sel});
         if (dot) {{ dot.setAttribute(\"cx\", {x}); dot.setAttribute(\"cy\", {y}); }}
         return true;",
        sel = js_str(&format!("#{OVERLAY_ID} circle")),
        x = point.x,
        y = point.y,
    )
}

#[async_trait]
impl PathVisualizer for CdpVisualizer {
    async fn replay(
        &self,
        path: &Path,
        frame_delay: Duration,
        config: &VisualizationConfig,
    ) -> GestureResult<()> {
        let _: bool = self.dom.eval(&overlay_body(path, config)).await?;
        if config.show_cursor {
            for point in path.points() {
                let _: bool = self.dom.eval(&cursor_body(*point)).await?;
                tokio::time::sleep(frame_delay).await;
            }
        }
        tokio::time::sleep(Duration::from_millis(config.linger_ms)).await;
        let _: bool = self
            .dom
            .eval(&format!(
                "document.getElementById({})?.remove(); return true;",
                js_str(OVERLAY_ID)
            ))
            .await?;
        Ok(())
    }
}

/// Options for launching a local Chromium
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a window
    pub headless: bool,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
    /// Chromium executable (auto-detected when `None`)
    pub chromium_path: Option<PathBuf>,
    /// Window size in pixels
    pub viewport: (u32, u32),
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            viewport: (1280, 720),
        }
    }
}

/// A launched browser with one page wrapped as a [`CdpDom`]
#[derive(Debug)]
pub struct CdpSession {
    browser: Browser,
    handler: JoinHandle<()>,
    dom: CdpDom,
}

impl CdpSession {
    /// Launch Chromium and open `url`
    ///
    /// # Errors
    ///
    /// Returns `Dom` if the browser cannot be launched or the page cannot
    /// be opened
    pub async fn launch(options: LaunchOptions, url: &str) -> GestureResult<Self> {
        let mut builder = BrowserConfig::builder().window_size(options.viewport.0, options.viewport.1);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| GestureError::dom(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| GestureError::dom(format!("browser launch: {e}")))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| GestureError::dom(format!("new page: {e}")))?;
        tracing::info!(%url, headless = options.headless, "browser session started");

        Ok(Self {
            browser,
            handler,
            dom: CdpDom::new(page),
        })
    }

    /// The page as a [`Dom`]
    #[must_use]
    pub fn dom(&self) -> CdpDom {
        self.dom.clone()
    }

    /// Close the browser
    ///
    /// # Errors
    ///
    /// Returns `Dom` if the browser does not close cleanly
    pub async fn close(mut self) -> GestureResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| GestureError::dom(format!("browser close: {e}")))?;
        self.handler.abort();
        Ok(())
    }
}
