use baal_sim::config::{Configuration, InterfaceConfig, PlayerConfig, WorldConfig};
use baal_sim::world::WinState;
use baal_sim::Engine;

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let configuration = Configuration::create(
        InterfaceConfig("text".to_string()),
        WorldConfig::Hardcoded(1),
        PlayerConfig { caster_name: "Baal".to_string() },
    )?;

    let mut engine = Engine::new(configuration, "Baal", 0);

    tracing::info!("baal simulation starting");

    // No command-reading interface is wired up here (input/rendering are
    // out of scope for this core); run a bounded number of idle turns so
    // the binary terminates even if neither win condition is reached.
    const MAX_IDLE_TURNS: u32 = 10_000;
    let mut outcome = WinState::Ongoing;
    for _ in 0..MAX_IDLE_TURNS {
        outcome = engine.cycle_turn();
        if outcome != WinState::Ongoing {
            break;
        }
    }

    match outcome {
        WinState::CasterWins => {
            tracing::info!("the civilization's population has fallen to zero: the caster wins");
        }
        WinState::CivilizationWins => {
            tracing::info!(
                tech_level = engine.civilization.tech_level,
                "the civilization has reached the technology threshold: the civilization wins"
            );
        }
        WinState::Ongoing => {
            tracing::info!(turns = MAX_IDLE_TURNS, "simulation ended without a winner after the idle turn budget");
        }
    }

    Ok(())
}
