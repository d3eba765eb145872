use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use reel::core::config::{self, CliOverrides};
use reel::core::controller::{CarouselController, CarouselEvent, ImageState, NavigateAction};
use reel::core::slide::load_sequence;
use reel::player::{self, PlayerOptions};
use reel::prefetch::{HttpFetcher, ImagePrefetcher};

#[derive(Parser)]
#[command(name = "reel", about = "Headless stories carousel player")]
struct Args {
    /// Sequence file (TOML) to play
    sequence: PathBuf,

    /// Config file to use instead of ~/.reel/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL for relative media refs
    #[arg(long)]
    base_url: Option<String>,

    /// Slide to start from
    #[arg(long, default_value_t = 0)]
    start_index: usize,

    /// Default seconds per slide
    #[arg(long)]
    slide_seconds: Option<f64>,

    /// Do not prefetch the next slide's image
    #[arg(long)]
    no_prefetch: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Log file
    #[arg(long, default_value = "reel.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url.clone(),
            slide_seconds: args.slide_seconds,
            no_prefetch: args.no_prefetch,
        },
    );
    info!("Reel starting up with {:?}", resolved);

    let sequence = load_sequence(&args.sequence, resolved.slide_duration)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let fetcher = HttpFetcher::new(resolved.base_url.clone(), resolved.fetch_timeout);
    let prefetcher = Arc::new(ImagePrefetcher::new(Arc::new(fetcher)));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<CarouselEvent>();
    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if json {
                println!("{}", event_json(&event));
            } else {
                println!("{}", describe(&event));
            }
        }
    });

    // Stdin is read on a plain thread so a blocked read never holds up shutdown
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => match player::parse_command(&line) {
                    Some(input) => {
                        if input_tx.send(input).is_err() {
                            return;
                        }
                    }
                    None => warn!("Unknown command: {:?}", line.trim()),
                },
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    return;
                }
            }
        }
    });

    let mut controller = CarouselController::new(
        sequence,
        prefetcher,
        event_tx,
        resolved.controller_options(),
    );
    let outcome = player::run(
        &mut controller,
        input_rx,
        PlayerOptions {
            tick_interval: resolved.tick_interval,
            start_index: args.start_index,
            exit_on_finish: resolved.exit_on_finish,
        },
    )
    .await;
    info!("Playback ended: {:?}", outcome);

    // Dropping the controller closes the event channel so the printer drains and exits
    drop(controller);
    if let Err(e) = printer.await {
        warn!("Event printer failed: {}", e);
    }
    Ok(())
}

fn describe_image(state: &ImageState) -> String {
    match state {
        ImageState::Loading => "loading".to_string(),
        ImageState::Ready(resource) => format!(
            "ready ({} bytes, {})",
            resource.len(),
            resource.content_type.as_deref().unwrap_or("unknown type")
        ),
        ImageState::Unavailable => "placeholder".to_string(),
    }
}

fn describe(event: &CarouselEvent) -> String {
    match event {
        CarouselEvent::Header { title, icon } => format!(
            "header: {} | icon {}",
            title.as_deref().unwrap_or("(untitled)"),
            describe_image(icon)
        ),
        CarouselEvent::SlideChanged {
            index,
            slide,
            favorite,
        } => {
            let mut line = format!("slide {index}: {}", slide.title);
            if let Some(detail) = &slide.detail {
                line.push_str(&format!(" | {detail}"));
            }
            if let Some(price) = &slide.price {
                line.push_str(&format!(" | {price}"));
            }
            if *favorite {
                line.push_str(" | favorite");
            }
            line
        }
        CarouselEvent::Image { index, state } => format!("image {index}: {}", describe_image(state)),
        CarouselEvent::FavoriteChanged { index, favorite } => {
            format!("favorite {index}: {}", if *favorite { "on" } else { "off" })
        }
        CarouselEvent::SequenceFinished => "finished".to_string(),
        CarouselEvent::DismissRequested => "dismissed".to_string(),
        CarouselEvent::Navigate(action) => match action {
            NavigateAction::OpenSearch => "navigate: search".to_string(),
            NavigateAction::OpenSlide(i) => format!("navigate: open slide {i}"),
            NavigateAction::ToggleFavorite(i) => format!("navigate: favorite slide {i}"),
            NavigateAction::Share(i) => format!("navigate: share slide {i}"),
        },
    }
}

fn image_json(state: &ImageState) -> serde_json::Value {
    use serde_json::json;
    match state {
        ImageState::Loading => json!({ "state": "loading" }),
        ImageState::Ready(resource) => json!({
            "state": "ready",
            "bytes": resource.len(),
            "content_type": resource.content_type,
        }),
        ImageState::Unavailable => json!({ "state": "unavailable" }),
    }
}

fn event_json(event: &CarouselEvent) -> serde_json::Value {
    use serde_json::json;
    match event {
        CarouselEvent::Header { title, icon } => json!({
            "event": "header",
            "title": title,
            "icon": image_json(icon),
        }),
        CarouselEvent::SlideChanged {
            index,
            slide,
            favorite,
        } => json!({
            "event": "slide_changed",
            "index": index,
            "id": slide.id,
            "media": slide.media_ref.as_ref().map(|m| m.as_str()),
            "title": slide.title,
            "detail": slide.detail,
            "price": slide.price,
            "favorite": favorite,
            "duration_ms": slide.duration.as_millis() as u64,
        }),
        CarouselEvent::Image { index, state } => {
            let mut value = image_json(state);
            value["event"] = json!("image");
            value["index"] = json!(index);
            value
        }
        CarouselEvent::FavoriteChanged { index, favorite } => json!({
            "event": "favorite_changed",
            "index": index,
            "favorite": favorite,
        }),
        CarouselEvent::SequenceFinished => json!({ "event": "sequence_finished" }),
        CarouselEvent::DismissRequested => json!({ "event": "dismiss_requested" }),
        CarouselEvent::Navigate(action) => {
            let (kind, index) = match action {
                NavigateAction::OpenSearch => ("open_search", None),
                NavigateAction::OpenSlide(i) => ("open_slide", Some(*i)),
                NavigateAction::ToggleFavorite(i) => ("toggle_favorite", Some(*i)),
                NavigateAction::Share(i) => ("share", Some(*i)),
            };
            json!({ "event": "navigate", "action": kind, "index": index })
        }
    }
}
