use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use iasi_dash::api::{HttpIndexApi, IndexApi};
use iasi_dash::console::{ConsoleMap, ConsoleUi, StderrSpinner};
use iasi_dash::dashboard::Dashboard;
use iasi_dash::logging::{log, obj, v_str, Domain, Level};
use iasi_dash::poll::StatusPoller;
use iasi_dash::state::Config;
use tokio::time::{timeout_at, Duration, Instant};

const USAGE: &str = "usage: iasi-dash <command>
  render <event> [window]      load (remote, static, demo) and show an event
  reload <event> [window]      re-fetch an event from the server and show it
  publish <event>              upload the event's document to the server
  publish-aoi <file> [name]    upload an AOI GeoJSON file
  list                         list indices known to the server
  open <iasi.json> [window]    show a local iasi.json
  aoi <event> <file.geojson>   overlay a local AOI on an event
  watch [seconds]              poll server health/status";

fn arg(args: &[String], i: usize) -> Option<&str> {
    args.get(i).map(String::as_str)
}

fn required<'a>(args: &'a [String], i: usize, what: &str) -> Result<&'a str> {
    arg(args, i).ok_or_else(|| anyhow!("missing {}\n{}", what, USAGE))
}

async fn watch(cfg: &Config, seconds: u64) -> Result<()> {
    let api: Arc<dyn IndexApi> = Arc::new(HttpIndexApi::new(cfg).map_err(|e| anyhow!("{}", e))?);
    let mut poller = StatusPoller::spawn(
        api,
        Duration::from_secs(cfg.poll_delay_secs),
        Duration::from_secs(cfg.poll_secs.max(1)),
    );
    let deadline = Instant::now() + Duration::from_secs(seconds);
    while let Ok(Ok(())) = timeout_at(deadline, poller.updates.changed()).await {
        if let Some(status) = *poller.updates.borrow() {
            println!("health={:?} {}", status.health, status.summary());
        }
    }
    poller.stop();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cmd = arg(&args, 0).unwrap_or("render");

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[("command", v_str(cmd)), ("server_base", v_str(&cfg.server_base))]),
    );

    if cmd == "watch" {
        let seconds = arg(&args, 1).and_then(|s| s.parse().ok()).unwrap_or(30);
        return watch(&cfg, seconds).await;
    }
    if matches!(cmd, "-h" | "--help" | "help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut dash = Dashboard::from_config(&cfg, Box::new(ConsoleUi::new()), Box::new(ConsoleMap::new()))
        .map_err(|e| anyhow!("cannot start dashboard: {}", e))?
        .with_busy(Arc::new(StderrSpinner));

    match cmd {
        "render" => {
            let event = arg(&args, 1).unwrap_or(dash.selection().event.as_str()).to_string();
            dash.select(&event, arg(&args, 2)).await;
        }
        "reload" => {
            let event = required(&args, 1, "event")?;
            if let Some(w) = arg(&args, 2) {
                dash.set_window(w);
            }
            dash.reload(event).await;
        }
        "publish" => {
            let event = required(&args, 1, "event")?;
            dash.select(event, None).await;
            dash.publish().await;
        }
        "publish-aoi" => {
            let file = required(&args, 1, "AOI file")?;
            let name = arg(&args, 2).unwrap_or(dash.selection().event.as_str()).to_string();
            dash.publish_aoi(Path::new(file), &name).await;
        }
        "list" => {
            dash.list_remote().await;
        }
        "open" => {
            let file = required(&args, 1, "iasi.json path")?;
            if let Some(w) = arg(&args, 2) {
                dash.set_window(w);
            }
            dash.load_local_document(Path::new(file)).await;
        }
        "aoi" => {
            let event = required(&args, 1, "event")?;
            let file = required(&args, 2, "GeoJSON file")?;
            dash.select(event, None).await;
            dash.load_local_aoi(Path::new(file)).await;
        }
        other => return Err(anyhow!("unknown command {}\n{}", other, USAGE)),
    }
    Ok(())
}
