// filepath: src/main.rs

use log::{error, info, warn};
use rect_compositor::config::DemoConfig;
use rect_compositor::{Compositor, Operator, Rect, SoftwareGdi};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Write top-down `0xAARRGGBB` pixels as a binary PPM, dropping alpha
fn write_ppm(path: &Path, width: u32, height: u32, pixels: &[u32]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    for &p in pixels {
        out.write_all(&[(p >> 16) as u8, (p >> 8) as u8, p as u8])?;
    }
    out.flush()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting rect-compositor demo");

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => DemoConfig::load_from_path(&path)?,
        None => DemoConfig::load_from_file().unwrap_or_else(|e| {
            warn!("Falling back to default configuration: {}", e);
            DemoConfig::default()
        }),
    };
    info!(
        "Configuration loaded: {}x{} surface, {} fills",
        config.width,
        config.height,
        config.fills.len()
    );

    let gdi = SoftwareGdi::new();
    let surface = gdi
        .create_surface(config.width, config.height, config.background())
        .ok_or_else(|| {
            format!(
                "cannot create a {}x{} surface",
                config.width, config.height
            )
        })?;
    let compositor = Compositor::new(&gdi);

    let (width, height) = gdi
        .surface_size(surface)
        .ok_or("destination surface disappeared")?;
    let full = Rect::from_size(width, height);
    compositor.fill_rect(surface, &full, config.background(), Operator::Src)?;

    let mut failed = 0;
    for (i, fill) in config.fills.iter().enumerate() {
        match compositor.fill_rect(surface, &fill.rect(), fill.color(), fill.operator) {
            Ok(()) => info!(
                "Fill {}: {:?} {:?} ({}) done",
                i,
                fill.rect(),
                fill.color(),
                fill.operator
            ),
            Err(e) => {
                error!("Fill {} failed: {}", i, e);
                failed += 1;
            }
        }
    }

    let stats = gdi.stats();
    info!(
        "Handles: {} bitmaps created / {} deleted, {} contexts created / {} deleted",
        stats.bitmaps_created, stats.bitmaps_deleted, stats.dcs_created, stats.dcs_deleted
    );
    if !stats.is_balanced() {
        warn!("{} native handles still alive", gdi.live_handles());
    }

    if let Some(path) = &config.output {
        let pixels = gdi
            .read_surface(surface)
            .ok_or("destination surface disappeared")?;
        write_ppm(path, config.width, config.height, &pixels)?;
        info!("Wrote {}", path.display());
    }

    gdi.destroy_surface(surface);
    if failed > 0 {
        return Err(format!("{} of {} fills failed", failed, config.fills.len()).into());
    }
    Ok(())
}
