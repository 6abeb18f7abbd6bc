mod events;

use std::error::Error;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use camrec_core::{CaptureConfiguration, LifecycleCoordinator};
use camrec_virtual::{container, MemoryRenderer, VirtualDevices, VirtualEncoderFactory};

use events::StdoutDelegate;

/// Usage: `record-demo [config.json] [seconds]`
fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("record-demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => CaptureConfiguration::from_json(&std::fs::read_to_string(&path)?)?,
        None => CaptureConfiguration::default(),
    };
    let seconds: f64 = match args.next() {
        Some(s) => s.parse()?,
        None => 2.0,
    };

    let (gain_min, gain_max) = (config.gain_min, config.gain_max);
    let mut coordinator = LifecycleCoordinator::new(
        config,
        VirtualDevices::default(),
        VirtualEncoderFactory::new(),
        MemoryRenderer::new(),
    )?;
    coordinator.set_delegate(Arc::new(StdoutDelegate));

    coordinator.start_requested()?;
    coordinator
        .upload_overlay(badge_png()?)?
        .join()
        .map_err(|_| "overlay decode thread panicked")?;

    // Sweep the gain from max to min over the take.
    let started = Instant::now();
    let total = Duration::from_secs_f64(seconds.max(0.1));
    while started.elapsed() < total {
        let progress = started.elapsed().as_secs_f32() / total.as_secs_f32();
        coordinator.set_gain(gain_max - (gain_max - gain_min) * progress);
        events::emit("levels", &coordinator.current_levels());
        thread::sleep(Duration::from_millis(250));
    }

    coordinator.stop_requested()?;

    if let Some(surface) = coordinator.play_requested()? {
        for (i, take) in container::parse(&surface.data)?.iter().enumerate() {
            log::info!(
                "Take {}: {}x{}, {} frames, {:.2}s audio",
                i + 1,
                take.header.width,
                take.header.height,
                take.frames,
                take.audio_duration_secs()
            );
        }
    }
    Ok(())
}

/// A translucent square badge with an opaque border.
fn badge_png() -> Result<Vec<u8>, image::ImageError> {
    let badge = image::RgbaImage::from_fn(64, 64, |x, y| {
        let border = x < 4 || y < 4 || x >= 60 || y >= 60;
        if border {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([220, 40, 40, 128])
        }
    });
    let mut bytes = Vec::new();
    badge.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}
