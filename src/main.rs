use std::time::Instant;

use anyhow::Result;
use log::{debug, info};

use detgeo::checker::check_consistency;
use detgeo::demo::barrel_detector;
use detgeo::io::MaterialMapWriter;
use detgeo::scan::{generate_helices, scan, time_per_helix, ScanSummary};
use detgeo::settings;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = settings::load_config()?;
    debug!("effective configuration:\n{}", settings.to_toml()?);

    let det = barrel_detector(&settings.demo_config());
    info!("built {}", det);

    let report = check_consistency(&det, settings.verbose_check)?;
    info!(
        "detector '{}' is consistent ({} warnings)",
        det.name,
        report.warnings.len()
    );

    let scan_config = settings.scan_config();
    let helices = generate_helices(&scan_config);

    let start = Instant::now();
    let hits = scan(&det, &helices, scan_config.mask_tolerance);
    let duration = start.elapsed();

    let summary = ScanSummary::new(&hits);
    println!(
        "Time taken: {:.2?}, Time per helix: {:.2?}",
        duration,
        time_per_helix(duration, helices.len())
    );
    println!(
        "{} helices, {} surface hits, {} without hits",
        summary.n_helices, summary.n_hits, summary.n_empty
    );
    for (vol, n) in &summary.hits_per_volume {
        let name = det.names.get(vol).map(String::as_str).unwrap_or("?");
        println!("  volume {} ({}): {} hits", vol, name, n);
    }

    if let Some(path) = &settings.output {
        MaterialMapWriter::write(&det, &det.names, path)?;
        info!("wrote material maps to {}", path.display());
    }

    Ok(())
}
