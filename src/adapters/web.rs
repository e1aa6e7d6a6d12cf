//! HTTP surface.
//!
//! Routing and response rendering live in [`WebController`], which only
//! touches the shared channels (override flag, status cell, kill switch),
//! so it runs unchanged under host tests.  On ESP-IDF [`start_server`]
//! mounts every [`Route`] on an `EspHttpServer`.
//!
//! | Path                   | Effect                                   |
//! |------------------------|------------------------------------------|
//! | `/`                    | HTML page with the latest reading        |
//! | `/custom-button-press` | request a manual watering cycle          |
//! | `/stop-pump`           | release the relay now (emergency stop)   |
//! | `/get-humidity`        | latest percentage as plain text          |
//! | `/api/status`          | full status snapshot as JSON             |

use std::sync::Mutex;

use log::{info, warn};

use crate::app::ports::GpioPort;
use crate::app::signals::OverrideRequest;
use crate::app::status::StatusPublisher;
use crate::control::ActivationState;
use crate::drivers::pump::PumpKillSwitch;

const TEXT: &str = "text/plain; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";
const JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Override,
    StopPump,
    Humidity,
    Status,
    NotFound,
}

impl Route {
    /// Every mountable route with its path.
    pub const ALL: [(&'static str, Route); 5] = [
        ("/", Route::Index),
        ("/custom-button-press", Route::Override),
        ("/stop-pump", Route::StopPump),
        ("/get-humidity", Route::Humidity),
        ("/api/status", Route::Status),
    ];

    /// Match a request URI; the query string is ignored.
    pub fn parse(uri: &str) -> Self {
        let path = uri.split_once('?').map_or(uri, |(p, _)| p);
        Self::ALL
            .iter()
            .find(|(p, _)| *p == path)
            .map_or(Route::NotFound, |(_, r)| *r)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl WebResponse {
    fn new(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        Self { status, content_type, body: body.into() }
    }
}

pub struct WebController<'a, G> {
    override_request: &'a OverrideRequest,
    status: &'a StatusPublisher,
    kill: Mutex<PumpKillSwitch<'a, G>>,
}

impl<'a, G: GpioPort> WebController<'a, G> {
    pub fn new(
        override_request: &'a OverrideRequest,
        status: &'a StatusPublisher,
        kill: PumpKillSwitch<'a, G>,
    ) -> Self {
        Self { override_request, status, kill: Mutex::new(kill) }
    }

    pub fn handle(&self, route: Route) -> WebResponse {
        match route {
            Route::Index => self.index(),
            Route::Override => {
                self.override_request.request();
                info!("web: manual watering requested");
                WebResponse::new(200, TEXT, "watering requested")
            }
            Route::StopPump => self.stop_pump(),
            Route::Humidity => match self.status.measurement() {
                Some(m) => WebResponse::new(200, TEXT, format!("{:.1}", m.percent)),
                None => WebResponse::new(503, TEXT, "unavailable"),
            },
            Route::Status => match serde_json::to_string(&self.status.snapshot()) {
                Ok(body) => WebResponse::new(200, JSON, body),
                Err(e) => {
                    warn!("web: status encode failed: {}", e);
                    WebResponse::new(500, TEXT, "encode error")
                }
            },
            Route::NotFound => WebResponse::new(404, TEXT, "not found"),
        }
    }

    fn stop_pump(&self) -> WebResponse {
        let Ok(mut kill) = self.kill.lock() else {
            return WebResponse::new(500, TEXT, "kill switch unavailable");
        };
        match kill.trip() {
            Ok(()) => {
                warn!("web: emergency stop");
                WebResponse::new(200, TEXT, "pump stopped")
            }
            Err(e) => WebResponse::new(500, TEXT, format!("stop failed: {}", e)),
        }
    }

    fn index(&self) -> WebResponse {
        let snap = self.status.snapshot();
        let reading = snap
            .measurement
            .map_or_else(|| "--".to_string(), |m| format!("{:.1}%", m.percent));
        let state = match snap.state {
            ActivationState::Idle => "idle",
            ActivationState::Active => "watering cycle active",
        };
        let pump = if snap.pump_on { "on" } else { "off" };
        let body = format!(
            "<!doctype html>\n<html lang=\"en\">\n<meta charset=\"utf-8\" />\n\
             <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\" />\n\
             <title>SoilGuard</title>\n\
             <h1>SoilGuard</h1>\n\
             <p>Reading: <b id=\"reading\">{reading}</b></p>\n\
             <p>State: {state}, pump {pump}</p>\n\
             <button onclick=\"fetch('/custom-button-press')\">Water now</button>\n\
             <button onclick=\"fetch('/stop-pump')\">Stop pump</button>\n\
             <script>\n\
             setInterval(async () => {{\n\
               const r = await fetch('/get-humidity');\n\
               if (r.ok) document.getElementById('reading').textContent = (await r.text()) + '%';\n\
             }}, 2000);\n\
             </script>\n</html>\n"
        );
        WebResponse::new(200, HTML, body)
    }
}

/// Mount every route on a new HTTP server.  The returned server must be
/// kept alive for the handlers to stay registered.
#[cfg(target_os = "espidf")]
pub fn start_server<G>(
    controller: &'static WebController<'static, G>,
) -> anyhow::Result<esp_idf_svc::http::server::EspHttpServer<'static>>
where
    G: GpioPort + Send + 'static,
{
    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::Write;

    let cfg = Configuration {
        stack_size: 8 * 1024,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&cfg)?;

    for (uri, route) in Route::ALL {
        server.fn_handler(uri, Method::Get, move |req| -> anyhow::Result<()> {
            let resp = controller.handle(route);
            let headers = [("Content-Type", resp.content_type)];
            let mut out = req.into_response(resp.status, None, &headers)?;
            out.write_all(resp.body.as_bytes())?;
            Ok(())
        })?;
    }

    info!("web: HTTP server listening on port {}", cfg.http_port);
    Ok(server)
}
