//! CREASE demo - drive one session from upload to results
//!
//! Usage: crease-demo [VIDEO] [--config FILE] [--json-logs]
//!
//! Without a video a synthetic 20 MB `swing.mp4` is submitted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crease_core::MediaFile;
use crease_runtime::{
    init_tracing, CreaseConfig, SessionController, SessionEvent, SessionIntent, SessionRuntime,
    TelemetryConfig,
};

struct Args {
    video: Option<PathBuf>,
    config: Option<PathBuf>,
    json_logs: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        video: None,
        config: None,
        json_logs: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a file")?;
                args.config = Some(PathBuf::from(path));
            }
            "--json-logs" => args.json_logs = true,
            "-h" | "--help" => {
                return Err("usage: crease-demo [VIDEO] [--config FILE] [--json-logs]".into())
            }
            _ if args.video.is_none() => args.video = Some(PathBuf::from(&arg)),
            other => return Err(format!("unexpected argument: {}", other)),
        }
    }
    Ok(args)
}

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

fn load_video(path: Option<&Path>) -> std::io::Result<MediaFile> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(MediaFile::new(name, media_type_for(path), bytes))
        }
        None => Ok(MediaFile::declared("swing.mp4", "video/mp4", 20 * 1024 * 1024)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    let telemetry = if args.json_logs {
        TelemetryConfig::json()
    } else {
        TelemetryConfig::default()
    };
    init_tracing(&telemetry)?;

    let mut config = match &args.config {
        Some(path) => CreaseConfig::load(path)?,
        None => CreaseConfig::default(),
    };
    if args.config.is_none() {
        config.apply_env()?;
        config.validate()?;
    }

    let video = load_video(args.video.as_deref())?;
    let runtime_config = config.runtime.clone();
    let controller = SessionController::new(config)?;
    let (handle, mut events, task) = SessionRuntime::spawn(controller, runtime_config);

    println!("Session {}", handle.view().session);
    handle.send(SessionIntent::Select(vec![video])).await?;
    handle.send(SessionIntent::Start).await?;

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::UploadProgress { percent, .. } => println!("  uploading {:>3}%", percent),
            SessionEvent::ResultsReady { url, .. } => {
                println!("  results ready at {}", url);
                break;
            }
            SessionEvent::MediaFailed(e) => {
                println!("  analysis unavailable: {}", e);
                break;
            }
            _ => {}
        }
    }

    tokio::time::sleep(Duration::from_millis(1500)).await;
    println!("{}", serde_json::to_string_pretty(&handle.view())?);

    handle.shutdown().await?;
    task.await?;
    Ok(())
}
