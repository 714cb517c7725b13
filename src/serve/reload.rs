// src/serve/reload.rs

//! Browser live reload: a broadcast hub fed by the pipelines, and the
//! client snippet injected into served HTML.

use anyhow::Context;
use regex::Regex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::errors::Result;

/// Path of the Server-Sent Events endpoint.
pub const RELOAD_PATH: &str = "/__sitepipe/reload";

/// Client that listens on [`RELOAD_PATH`]: `css` swaps stylesheets in
/// place, `reload` reloads the page.
pub const CLIENT_SCRIPT: &str = r#"<script>
(function () {
  var source = new EventSource("/__sitepipe/reload");
  source.addEventListener("reload", function () { window.location.reload(); });
  source.addEventListener("css", function () {
    document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {
      var url = new URL(link.href);
      url.searchParams.set("sitepipe", Date.now());
      link.href = url.toString();
    });
  });
})();
</script>
"#;

/// What connected browsers should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Re-fetch stylesheets without a page reload.
    Css,
    Full,
}

impl ReloadEvent {
    /// SSE event name understood by [`CLIENT_SCRIPT`].
    pub fn event_name(self) -> &'static str {
        match self {
            ReloadEvent::Css => "css",
            ReloadEvent::Full => "reload",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn notify(&self, event: ReloadEvent) {
        match self.tx.send(event) {
            Ok(clients) => debug!(?event, clients, "reload sent"),
            Err(_) => debug!(?event, "no browsers connected"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }
}

/// Inserts [`CLIENT_SCRIPT`] into HTML documents.
#[derive(Debug, Clone)]
pub struct ReloadInjector {
    body_close: Regex,
}

impl ReloadInjector {
    pub fn new() -> Result<Self> {
        let body_close = Regex::new(r"(?i)</body>").context("compiling </body> matcher")?;
        Ok(Self { body_close })
    }

    /// Insert the client before the last `</body>`, or append it when the
    /// document has none.
    pub fn inject(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len() + CLIENT_SCRIPT.len());
        match self.body_close.find_iter(html).last() {
            Some(m) => {
                out.push_str(&html[..m.start()]);
                out.push_str(CLIENT_SCRIPT);
                out.push_str(&html[m.start()..]);
            }
            None => {
                out.push_str(html);
                out.push_str(CLIENT_SCRIPT);
            }
        }
        out
    }
}
