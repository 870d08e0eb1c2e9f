//! Headless demo: builds a short road into an in-memory world, then undoes it.
//! The `road` template is read from the configured template directory when
//! present there, otherwise a built-in one is used.
//!
//! Usage: `pathforge [config.toml|config.json]`

use anyhow::Context;
use pathforge::{
    init_logging, open_template_store, BlockState, BuildEvent, BuildService, Config,
    CooperativeScheduler, CurveKind, EventDispatcher, MemoryWorld, Slice, Template, TickDriver,
    UserId, Vec3, BUILD_DATE, VERSION,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

const DEMO_TEMPLATE: &str = "road";

fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!(version = VERSION, built = BUILD_DATE, "pathforge starting");

    let config = load_config()?;
    let events = EventDispatcher::default();
    let mut rx = events.subscribe();

    let templates = open_template_store(&config, demo_template()?)?;
    let mut service = BuildService::new(&config, templates, events)?;

    let user = UserId::new();
    let session = service.session(user);
    session.set_curve_kind(CurveKind::Arc);
    let a = session.place_node(Vec3::new(0.0, 64.0, 0.0));
    let b = session.place_node(Vec3::new(16.0, 64.0, 0.0));
    let c = session.place_node(Vec3::new(28.0, 68.0, 12.0));
    session.graph_mut().connect(a, b, CurveKind::Straight)?;
    session.begin_connection(b)?;
    session.complete_connection(c)?;
    session
        .graph_mut()
        .attach_anchor(b, c, Vec3::new(24.0, 66.0, 3.0))?;

    let mut scheduler = CooperativeScheduler::new();
    let mut world = MemoryWorld::new();
    let driver = TickDriver::new(config.placement.tick_rate_hz);

    service.build(&mut scheduler, user, DEMO_TEMPLATE)?;
    let ticks = driver.run_until_idle(&mut scheduler, &mut world);
    drain_events(&mut rx);
    tracing::info!(ticks, blocks = world.block_count(), "build finished");
    log_block_counts(&world);

    service.undo(&mut scheduler, user);
    let ticks = driver.run_until_idle(&mut scheduler, &mut world);
    drain_events(&mut rx);
    tracing::info!(ticks, blocks = world.block_count(), "undo finished");

    service.end_session(user);
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Config::load_from_file(&path)
            .with_context(|| format!("loading {}", path.display())),
        None => match Config::default_path() {
            Ok(path) => Ok(Config::load_or_default(&path)?),
            Err(e) => {
                tracing::warn!(error = %e, "no config directory, using defaults");
                Ok(Config::default())
            }
        },
    }
}

fn log_block_counts(world: &MemoryWorld) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, state) in world.iter() {
        *counts.entry(state.name()).or_default() += 1;
    }
    for (name, count) in counts {
        tracing::info!(block = name, count, "placed");
    }
}

/// Five wide: a stone deck with slab kerbs and a lantern every eighth step.
fn demo_template() -> anyhow::Result<Template> {
    let stone = Some(BlockState::new("minecraft:stone_bricks"));
    let slab = Some(BlockState::parse("minecraft:stone_brick_slab[type=bottom]")?);
    let lantern = Some(BlockState::new("minecraft:lantern"));

    let deck = || vec![slab.clone(), stone.clone(), stone.clone(), stone.clone(), slab.clone()];
    let plain = Slice::from_rows(vec![deck(), vec![None; 5]])?;
    let lit = Slice::from_rows(vec![deck(), vec![lantern, None, None, None, None]])?;

    let mut template = Template::new(DEMO_TEMPLATE, 5, 2).with_offsets(2, 0).with_period(8);
    template.push_slice(lit)?;
    for _ in 1..8 {
        template.push_slice(plain.clone())?;
    }
    Ok(template)
}

/// Log everything buffered on the event channel.
fn drain_events(rx: &mut Receiver<BuildEvent>) {
    loop {
        match rx.try_recv() {
            Ok(event) => tracing::info!(%event, "event"),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log lagged");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
