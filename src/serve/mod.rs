//! Development server with live reload.
//!
//! Serves `serve.base_dir` over HTTP and pushes reload messages to browsers
//! over a WebSocket when files matching `serve.reload` change. Both ports
//! are bound up front; failing to bind either is fatal.

mod content;
mod path;
mod response;

use path::{Resolved, resolve_path};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tiny_http::{Request, Server};

use crate::config::PipelineConfig;
use crate::embed::serve::{RELOAD_JS_URL, reload_script_tag};
use crate::reload::{ReloadHub, spawn_reload_watcher};
use crate::{debug, log};

/// State shared by request handlers.
struct Site {
    root: PathBuf,
    ws_port: u16,
    script: String,
}

/// Dev server entry point.
pub struct DevServer;

impl DevServer {
    /// Bind HTTP and the reload channel, then hand both loops to the
    /// background. Must be called inside the tokio runtime.
    pub fn start(config: Arc<PipelineConfig>) -> Result<()> {
        let serve = &config.serve;
        let addr = SocketAddr::new(serve.interface, serve.port);
        let server = Server::http(addr).map_err(|e| anyhow!("failed to bind http://{addr}: {e}"))?;

        let ws_addr = SocketAddr::new(serve.interface, serve.ws_port);
        let hub = ReloadHub::bind(ws_addr)?;
        spawn_reload_watcher(&config, hub)?;

        let site = Arc::new(Site {
            root: config.serve_dir(),
            ws_port: serve.ws_port,
            script: reload_script_tag(),
        });

        log!("serve"; "http://{}", addr);
        debug!("serve"; "root {}, reload ws://{}", site.root.display(), ws_addr);

        let runtime = tokio::runtime::Handle::current();
        std::thread::Builder::new()
            .name("http".into())
            .spawn(move || run_request_loop(&server, &site, &runtime))?;
        Ok(())
    }
}

fn run_request_loop(server: &Server, site: &Arc<Site>, runtime: &tokio::runtime::Handle) {
    for request in server.incoming_requests() {
        let site = Arc::clone(site);
        runtime.spawn_blocking(move || {
            if let Err(e) = handle_request(request, &site) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
}

fn handle_request(request: Request, site: &Site) -> Result<()> {
    debug!("serve"; "{} {}", request.method(), request.url());

    if request.url() == RELOAD_JS_URL {
        return response::respond_reload_js(request, site.ws_port);
    }

    match resolve_path(request.url(), &site.root) {
        Resolved::File(path) => response::respond_file(request, &path, &site.script),
        Resolved::Forbidden => response::respond_forbidden(request),
        Resolved::NotFound => response::respond_not_found(request),
    }
}
