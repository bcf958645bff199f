mod demo_host;

use std::path::PathBuf;
use std::time::Duration;

use color_eyre::Result;
use padbridge::controller::{Buttons, GilrsSource, HardwareSource, RawPadState, ScriptedSource, StickVector};
use padbridge::mapping::RemapContext;
use padbridge::screen::placement::PlacementMode;
use padbridge::screen::{ScreenId, ScreenKind, SubState};
use padbridge::{BridgeConfig, InputBridge};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::demo_host::DemoHost;

/// Host frame interval the demo emulates.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => BridgeConfig::load(&path)?,
        None => BridgeConfig::load_or_default(),
    };

    let (source, scripted_ticks) = select_source(&config);
    let mut bridge = InputBridge::create(config).attach(source);
    bridge.set_context(RemapContext::Gameplay);

    let mut host = DemoHost::new(1280.0, 720.0);
    let screen = ScreenId(1);
    bridge.on_screen_opened(screen, ScreenKind::Placement(PlacementMode::Build));
    bridge.on_sub_state_changed(screen, SubState::Spatial);

    info!("Starting tick loop every {:?}", TICK_INTERVAL);
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }

        let tick = bridge.begin_tick();
        let update = bridge.update(&mut host);
        if let Some(outcome) = update.placement {
            info!("Tick {}: {:?}", tick, outcome);
        }
        debug!("Tick {}: overlay {:?}", tick, bridge.overlay());

        if host.exit_requested {
            bridge.on_screen_closed(screen);
            break;
        }
        if scripted_ticks.is_some_and(|limit| tick >= limit) {
            info!("Demo script finished");
            break;
        }
    }

    info!(
        "Done after {} ticks, {} entities placed",
        bridge.tick(),
        host.entity_count()
    );
    Ok(())
}

/// Uses the first connected gamepad, or a short scripted session when none
/// is available. Returns the script length for scripted sessions.
fn select_source(config: &BridgeConfig) -> (Box<dyn HardwareSource>, Option<u64>) {
    match GilrsSource::create(config.layout) {
        Ok(source) if source.active_gamepad().is_some() => return (Box::new(source), None),
        Ok(_) => warn!("No gamepad found, running scripted demo"),
        Err(e) => warn!("Gamepad input unavailable ({}), running scripted demo", e),
    }

    let idle = RawPadState::default();
    let right = RawPadState {
        left_stick: StickVector::new(1.0, 0.0),
        ..Default::default()
    };
    let confirm = RawPadState {
        buttons: Buttons::A,
        ..Default::default()
    };
    let cancel = RawPadState {
        buttons: Buttons::B,
        ..Default::default()
    };

    let mut script = ScriptedSource::new();
    script
        .push_repeated(idle, 5)
        .push_repeated(right, 30)
        .push_repeated(confirm, 3)
        .push_repeated(idle, 5)
        .push(cancel)
        .push(idle)
        .push(cancel)
        .push_repeated(idle, 5);
    let ticks = script.remaining() as u64;
    (Box::new(script), Some(ticks))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
