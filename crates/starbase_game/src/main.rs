//! Headless Starbase simulation
//!
//! Usage: `starbase [CONFIG] [TICKS]`. `CONFIG` is a `.toml` or `.ron`
//! game configuration; `TICKS` defaults to ten seconds of simulation.

use starbase_engine::foundation::logging;
use starbase_engine::foundation::math::Vec2;
use starbase_game::components::ActionFlags;
use starbase_game::systems::BulletFired;
use starbase_game::{Game, GameConfig, GameError};

fn run(config_path: Option<&str>, ticks: Option<u64>) -> Result<(), GameError> {
    let mut game = match config_path {
        Some(path) => Game::from_config_file(path)?,
        None => Game::new(GameConfig::default())?,
    };
    let ticks = ticks.unwrap_or_else(|| u64::from(game.config().physics.tick_rate) * 10);

    game.entities_mut()
        .events_mut()
        .connect(|event: &BulletFired| log::debug!("Ship {} fired bullet {}", event.ship, event.bullet));

    game.spawn_planet(Vec2::zeros(), 1000.0, 20.0, "models/planets/planet-0");
    let ship = game.spawn_ship(Vec2::new(0.0, -60.0), "models/ships/ship-0");

    for _ in 0..ticks {
        let step = game.step();
        let mut actions = ActionFlags::THRUST_FORWARD;
        if step % 30 == 0 {
            actions |= ActionFlags::FIRE_PRIMARY;
        }
        if (step / 120) % 2 == 1 {
            actions |= ActionFlags::ROTATE_LEFT;
        }
        // the ship only becomes addressable once the first update commits it
        if step > 0 {
            game.set_ship_actions(ship, actions)?;
        }

        game.update();
    }

    let drawn = game.render().len();
    let bodies = game.physics_world().borrow().body_count();
    let stats = game.entities().stats();
    log::info!(
        "Simulated {} ticks: {} entities, {} drawn, {} bodies, {} staged accesses",
        game.step(),
        game.entities().len(),
        drawn,
        bodies,
        stats.staged_accesses
    );
    Ok(())
}

fn main() {
    logging::init_with_default_filter("info");

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let ticks = match args.next().map(|arg| arg.parse::<u64>()) {
        Some(Ok(ticks)) => Some(ticks),
        Some(Err(e)) => {
            log::error!("Invalid tick count: {e}");
            std::process::exit(2);
        }
        None => None,
    };

    log::info!("Starting Starbase headless simulation");
    if let Err(e) = run(config_path.as_deref(), ticks) {
        log::error!("Simulation failed: {e}");
        std::process::exit(1);
    }
}
