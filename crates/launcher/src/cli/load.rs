//! The `launcher load` command.
//!
//! Queues every source on the background loader and acts as the UI thread:
//! callbacks arrive on this task through the UI run loop, which prints one
//! JSON line per finished request.

use clap::Args;
use launcher_core::images::LoadRequest;
use launcher_core::{
    ui_channel, Config, ImageLoader, ImageSource, LauncherContext, LoadOptions, OnLoad, QUIT,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::parse_size;

/// Arguments for the `load` command.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Image paths or `sha1:<hash>` references
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Requested size as WIDTHxHEIGHT (defaults to the natural size)
    #[arg(long, value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Treat the images as cover art
    #[arg(long)]
    pub cover: bool,

    /// Directory to write the loaded images to, as PNG
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One line of `load` output.
#[derive(Debug, Serialize)]
struct LoadReport {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the load command.
pub async fn execute(args: LoadArgs, config: Config) -> anyhow::Result<()> {
    let output_dir = args
        .output
        .as_deref()
        .map(|dir| PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned()));
    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let context = LauncherContext::init(config)?;
    let (ui, mut run_loop) = ui_channel();
    let loader = ImageLoader::new(context.config(), Arc::new(ui))?;
    loader.listen_for_quit(context.signals());

    let options = if args.cover {
        LoadOptions::cover()
    } else {
        LoadOptions::default()
    };
    let finished = Arc::new(AtomicUsize::new(0));

    let requests: Vec<Arc<LoadRequest>> = args
        .sources
        .iter()
        .map(|value| {
            let on_load = report_on_load(value.clone(), output_dir.clone(), finished.clone());
            loader.load_image(
                ImageSource::parse(value),
                args.size,
                options.clone(),
                Some(on_load),
            )
        })
        .collect();
    tracing::info!("Queued {} image(s)", requests.len());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while finished.load(Ordering::SeqCst) < requests.len() {
        tokio::select! {
            alive = run_loop.run_next() => {
                if !alive {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::warn!("Interrupted, {} request(s) unfinished",
                    requests.len() - finished.load(Ordering::SeqCst));
                context.signals().notify(QUIT);
                break;
            }
        }
    }

    loader.stop();
    Ok(())
}

/// Callback printing the report for one request.
fn report_on_load(value: String, output_dir: Option<PathBuf>, finished: Arc<AtomicUsize>) -> OnLoad {
    Box::new(move |request| {
        let report = build_report(&value, &request, output_dir.as_deref());
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("Failed to serialize report for {}: {}", value, e),
        }
        finished.fetch_add(1, Ordering::SeqCst);
    })
}

fn build_report(value: &str, request: &LoadRequest, output_dir: Option<&Path>) -> LoadReport {
    let mut report = LoadReport {
        source: value.to_string(),
        width: None,
        height: None,
        output: None,
        error: request.error().map(str::to_string),
    };

    let Some(image) = request.image() else {
        if report.error.is_none() {
            report.error = Some("no image".to_string());
        }
        return report;
    };
    report.width = Some(image.width());
    report.height = Some(image.height());

    if let (Some(dir), Some(source)) = (output_dir, request.source()) {
        let path = dir.join(output_name(source));
        match image.save(&path) {
            Ok(()) => report.output = Some(path),
            Err(e) => report.error = Some(format!("failed to write {}: {e}", path.display())),
        }
    }
    report
}

/// `<hash>.png` for cache references, `<stem>.png` for files.
fn output_name(source: &ImageSource) -> String {
    match source {
        ImageSource::Sha1(hash) => format!("{hash}.png"),
        ImageSource::Path(path) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            format!("{stem}.png")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name() {
        assert_eq!(
            output_name(&ImageSource::Sha1("3a1f00".to_string())),
            "3a1f00.png"
        );
        assert_eq!(
            output_name(&ImageSource::Path(PathBuf::from("/covers/Turrican II.jpg"))),
            "Turrican II.png"
        );
    }

    #[test]
    fn test_report_skips_empty_fields() {
        let report = LoadReport {
            source: "sha1:3a1f00".to_string(),
            width: None,
            height: None,
            output: None,
            error: Some("Fetch failed".to_string()),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"source":"sha1:3a1f00","error":"Fetch failed"}"#);
    }
}
