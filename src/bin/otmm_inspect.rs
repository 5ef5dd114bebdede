//! Load an OTMM map, print what it holds and optionally save it again
//!
//! ```text
//! otmm-inspect <map.otmm> [--catalog items.toml] [--config io.toml]
//!              [--monsters monsters.toml] [--npcs npcs.toml] [--resave out.otmm]
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use otmm_map_io::creature::CreatureDatabase;
use otmm_map_io::persistence::{
    load_map_file, probe_map_file, save_map_file, AlwaysAccept, LogProgress, OtmmLoader, OtmmSaver,
};
use otmm_map_io::{CreatureKind, ItemCatalog, ItemRegistry, Map, MapIoConfig};

const USAGE: &str = "usage: otmm-inspect <map.otmm> [--catalog items.toml] [--config io.toml] \
                     [--monsters monsters.toml] [--npcs npcs.toml] [--resave out.otmm]";

#[derive(Default)]
struct Args {
    map: PathBuf,
    catalog: Option<PathBuf>,
    config: Option<PathBuf>,
    monsters: Option<PathBuf>,
    npcs: Option<PathBuf>,
    resave: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut map = None;
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--catalog" => &mut args.catalog,
            "--config" => &mut args.config,
            "--monsters" => &mut args.monsters,
            "--npcs" => &mut args.npcs,
            "--resave" => &mut args.resave,
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            _ => {
                if map.replace(PathBuf::from(&arg)).is_some() {
                    bail!("only one map file may be given");
                }
                continue;
            }
        };
        let value = iter
            .next()
            .with_context(|| format!("{} needs a value", arg))?;
        *slot = Some(PathBuf::from(value));
    }
    args.map = map.context(USAGE)?;
    Ok(args)
}

fn load_creatures(path: Option<&PathBuf>) -> Result<CreatureDatabase> {
    match path {
        Some(path) => CreatureDatabase::load(path)
            .with_context(|| format!("loading creature names from {}", path.display())),
        None => Ok(CreatureDatabase::new()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => MapIoConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MapIoConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => ItemRegistry::load(path)
            .with_context(|| format!("loading item catalog from {}", path.display()))?,
        None => {
            // Without a catalog, assume the version the map was saved with
            let minor = probe_map_file(&args.map)?.unwrap_or_default();
            log::warn!("No item catalog given, items will not be decoded");
            ItemRegistry::new(u32::MAX, minor)
        }
    };
    let mut monsters = load_creatures(args.monsters.as_ref())?;
    let mut npcs = load_creatures(args.npcs.as_ref())?;

    let mut map = Map::default();
    let report = {
        let mut loader = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config)
            .with_progress(LogProgress::default())
            .with_prompt(AlwaysAccept);
        load_map_file(&mut loader, &mut map, &args.map)
            .with_context(|| format!("loading {}", args.map.display()))?
    };

    println!("{}", args.map.display());
    println!("  size:        {}x{}", map.width, map.height);
    println!("  description: {}", map.description);
    println!(
        "  catalog:     {}.{}",
        catalog.major_version(),
        catalog.minor_version()
    );
    println!("  tiles:       {}", map.tile_count());
    println!("  items:       {}", report.items);
    for kind in [CreatureKind::Monster, CreatureKind::Npc] {
        println!(
            "  {:<12} {} in {} spawns",
            format!("{}s:", kind.label()),
            map.creature_count(kind),
            map.spawns(kind).len()
        );
    }
    println!("  towns:       {}", map.towns.len());
    println!("  houses:      {}", map.houses.len());

    let missing = monsters.missing_names();
    if !missing.is_empty() {
        println!("  unknown monsters: {}", missing.join(", "));
    }
    let missing = npcs.missing_names();
    if !missing.is_empty() {
        println!("  unknown npcs: {}", missing.join(", "));
    }
    if !report.warnings.is_empty() {
        println!("  warnings:");
        for warning in &report.warnings {
            println!("    {}", warning);
        }
    }

    if let Some(out) = &args.resave {
        let mut saver = OtmmSaver::new(&catalog, &config).with_progress(LogProgress::default());
        let saved = save_map_file(&mut saver, &map, out)
            .with_context(|| format!("saving {}", out.display()))?;
        println!(
            "Saved {} tiles ({} bytes) to {}",
            saved.tiles_saved,
            saved.bytes_written,
            out.display()
        );
    }
    Ok(())
}
