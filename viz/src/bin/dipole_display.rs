//! Render a synthetic dipole scene with the inspection displays.
//!
//! Writes the difference image and its components, then a cutout figure per
//! cataloged dipole, as numbered PNGs in the output directory.
//!
//! ```text
//! RUST_LOG=info cargo run --bin dipole_display -- --output-dir plots --heavy --search 30,25
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use shared::image_proc::{
    array_to_gray_image, make_heavy_catalog, search_catalog, zscale, DipoleSceneConfig,
    DipoleTestImage,
};
use viz::config::DisplayConfig;
use viz::display::{dp_display_cutouts, dp_display_images, DisplayContext};

fn parse_position(s: &str) -> std::result::Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("Position must be in format 'x,y'".to_string());
    }

    let x = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid x value".to_string())?;
    let y = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid y value".to_string())?;

    Ok((x, y))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Display a synthetic dipole scene")]
struct Args {
    /// Directory for rendered figures
    #[arg(long, default_value = "plots")]
    output_dir: PathBuf,

    /// Display settings JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene description JSON file (defaults to two dipoles on a 100x50 image)
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Override the scene's noise seed
    #[arg(long)]
    seed: Option<u64>,

    /// Show footprint pixels only in the cutouts
    #[arg(long, default_value_t = false)]
    heavy: bool,

    /// Show the PSF stamp next to each exposure
    #[arg(long, default_value_t = false)]
    show_psf: bool,

    /// Upgrade the catalog to heavy footprints before displaying
    #[arg(long, default_value_t = false)]
    make_heavy: bool,

    /// Only show the source containing this position, as "x,y"
    #[arg(long, value_parser = parse_position)]
    search: Option<(f64, f64)>,

    /// Also write the raw difference image as an 8-bit grayscale PNG
    #[arg(long, default_value_t = false)]
    dump_gray: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DisplayConfig::load_from_file(path)
            .with_context(|| format!("loading display config {}", path.display()))?,
        None => DisplayConfig::default(),
    };

    let mut scene_config = match &args.scene {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading scene {}", path.display()))?;
            serde_json::from_str::<DipoleSceneConfig>(&json)?
        }
        None => DipoleSceneConfig::default(),
    };
    if let Some(seed) = args.seed {
        scene_config.seed = seed;
    }

    let mut scene = DipoleTestImage::generate(&scene_config)?;
    info!(
        "Generated {}x{} scene with {} dipoles",
        scene_config.width,
        scene_config.height,
        scene.catalog.len()
    );

    if args.make_heavy {
        let heavy = make_heavy_catalog(&mut scene.catalog, &scene.diffim, true)?;
        info!("{} heavy footprints", heavy.heavy_count());
    }

    let ctx = DisplayContext::png(&args.output_dir, config);
    if !ctx.has_backend() {
        anyhow::bail!("cannot write figures to {}", args.output_dir.display());
    }

    if args.show_psf {
        let options = viz::display::DisplayOptions {
            show_psf: true,
            ..ctx.options()
        };
        ctx.display_exposure(&scene.diffim, &options)?;
    } else {
        dp_display_images(&ctx, &scene)?;
    }

    match args.search {
        Some((x, y)) => match search_catalog(&scene.catalog, x, y)? {
            Some(record) => {
                info!("Source {} contains ({x}, {y})", record.id());
                dp_display_cutouts(&ctx, &scene, record, args.heavy)?;
            }
            None => info!("No source contains ({x}, {y})"),
        },
        None => {
            for record in &scene.catalog {
                dp_display_cutouts(&ctx, &scene, record, args.heavy)?;
            }
        }
    }

    if args.dump_gray {
        let diff = scene.diffim.masked_image().image().array();
        let range = zscale(&diff, ctx.config().contrast)?;
        let path = args.output_dir.join("diffim_gray.png");
        array_to_gray_image(&diff, range).save(&path)?;
        info!("Raw difference image written to {}", path.display());
    }

    Ok(())
}
