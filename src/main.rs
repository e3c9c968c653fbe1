//! Space Mission entry point
//!
//! Native builds run every mini-game headless with a simple autopilot and log
//! the outcomes. The web build only initialises logging; the page drives the
//! simulation through the library.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    space_mission::platform::init_logging();
    log::info!("Space Mission starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    space_mission::platform::init_logging();
    log::info!("Space Mission (native) starting...");

    let seed = space_mission::platform::now_ms() as u64;
    demo::run_all(seed);
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::Cell;
    use std::rc::Rc;

    use space_mission::help::HelpDesk;
    use space_mission::persistence::{KeyValueStore, default_store};
    use space_mission::progress::{MissionId, ProgressBook};
    use space_mission::scores::{HighScores, format_age};
    use space_mission::sim::missions::*;
    use space_mission::sim::{Episode, LandingProgram, Mission, Outcome};
    use space_mission::{FrameStatus, MissionRunner, Settings, platform};

    const LANDING_PROGRAM: &str = "
        # brake below 200 m, gear down below 100 m
        if altitude < 200 and velocity > 4 -> FIRE_THRUSTERS
        if altitude < 100 and velocity > 1 -> DEPLOY_LANDING_GEAR
        else -> MONITOR
    ";

    /// Tick until terminal, asking `pilot` for each control
    fn fly_episode<M: Mission>(
        mission: M,
        seed: u64,
        max_ticks: u32,
        mut pilot: impl FnMut(&M::State) -> Option<M::Control>,
    ) -> Episode<M> {
        let mut episode = Episode::new(mission, seed);
        for _ in 0..max_ticks {
            let control = pilot(episode.state());
            if episode.tick_default(control.as_ref()).is_some() {
                break;
            }
        }
        episode
    }

    fn fly<M: Mission>(
        mission: M,
        seed: u64,
        max_ticks: u32,
        pilot: impl FnMut(&M::State) -> Option<M::Control>,
    ) -> Outcome {
        fly_episode(mission, seed, max_ticks, pilot).outcome().clone()
    }

    type Book = ProgressBook<Box<dyn KeyValueStore>>;

    fn report(book: &mut Book, mission: MissionId, outcome: &Outcome) {
        match outcome {
            Outcome::Succeeded => {
                println!("✓ {:<12} succeeded", mission.storage_name());
                if book.mark_complete(mission) {
                    println!("  Phase {:?} complete!", mission.phase());
                }
            }
            Outcome::Failed(failure) => {
                println!("✗ {:<12} {}", mission.storage_name(), failure);
            }
            Outcome::Running => println!("… {:<12} still running", mission.storage_name()),
        }
    }

    pub fn run_all(seed: u64) {
        let mut book = ProgressBook::new(default_store());
        let desk = HelpDesk::default();
        let settings = Settings::load(&default_store());
        println!("\nWelcome, {}!\n", book.player_name());

        // Zero-gravity: turn toward the target, then burn
        let mut turns = 0;
        let mut burns = 0;
        let outcome = fly(ZeroGravityNavigation::default(), seed, 2000, |_| {
            if turns < 15 {
                turns += 1;
                Some(NavControl::RotateRight)
            } else if burns < 6 {
                burns += 1;
                Some(NavControl::Thrust)
            } else {
                None
            }
        });
        report(&mut book, MissionId::Navigation, &outcome);

        // Asteroid field: aim straight at the target every tick
        let pilot = |s: &RocketState| {
            let to_target = s.target.pos - s.pos;
            let angle = to_target.y.atan2(to_target.x).to_degrees();
            (s.fuel >= 1.0).then_some(AsteroidControl::Thrust { angle })
        };
        let outcome = fly(AsteroidDeflection::default(), seed, 2000, pilot);
        report(&mut book, MissionId::Asteroid, &outcome);

        // Orbit: launch at circular speed
        let orbit = fly_episode(OrbitalPuzzle::with_launch(0.0, 22.36), seed, 3000, |_| None);
        report(&mut book, MissionId::Orbital, orbit.outcome());
        let drawn = settings.visible_trail(&orbit.state().trail).count();
        println!("  trail: {drawn} of {} points drawn", orbit.state().trail.len());

        // Fuel: always take the biggest burn, driven through the runner
        let outcome = run_fuel_with_runner(&settings, seed);
        report(&mut book, MissionId::Fuel, &outcome);

        let outcome = fly(AtmosphericEntry::with_angle(25.0), seed, 2000, |_| None);
        report(&mut book, MissionId::Atmospheric, &outcome);

        let pilot = |s: &DescentState| {
            (!s.parachute_deployed && s.altitude < 2500.0).then_some(ParachuteControl::Deploy)
        };
        let outcome = fly(ParachuteDeployment::default(), seed, 100_000, pilot);
        report(&mut book, MissionId::Parachute, &outcome);

        match LANDING_PROGRAM.parse::<LandingProgram>() {
            Ok(program) => {
                let lander = LandingControl::with_controller(program);
                let outcome = fly(lander, seed, 10_000, |_| None);
                report(&mut book, MissionId::Landing, &outcome);
            }
            Err(e) => println!("✗ landing program does not compile: {e}"),
        }

        let mut answers = vec![
            AnalysisControl::Submit,
            AnalysisControl::Answer { question: "life".into(), option: "b".into() },
            AnalysisControl::Answer { question: "water".into(), option: "b".into() },
            AnalysisControl::Answer { question: "temperature".into(), option: "c".into() },
            AnalysisControl::Answer { question: "atmosphere".into(), option: "b".into() },
        ];
        let outcome = fly(PlanetaryAnalysis::default(), seed, 10, |_| answers.pop());
        report(&mut book, MissionId::Analysis, &outcome);

        let question = "How does gravity shape an orbit?";
        let answer = desk.ask_help(MissionId::Orbital.subject(), question);
        println!("\nIcarus: {answer}");
    }

    /// Fuel game through the host adapter with a simulated clock
    fn run_fuel_with_runner(settings: &Settings, seed: u64) -> Outcome {
        let mut runner = MissionRunner::new(settings.runner_config());
        let accomplished = Rc::new(Cell::new(false));
        let flag = accomplished.clone();
        runner.subscribe_success(move || flag.set(true));
        runner.subscribe_failure(|failure| log::info!("Fuel run ended: {failure}"));

        let handle = runner.start(FuelOptimization::default(), seed);
        let mut now = platform::now_ms();
        loop {
            runner.apply_control(FuelControl::Burn { amount: 200.0 });
            if runner.on_frame(handle, now) != FrameStatus::Continue {
                break;
            }
            now += settings.runner_config().tick_interval_ms;
        }

        if let Some(run) = runner.frame().map(|f| &f.state) {
            let mut store = default_store();
            let mut scores = HighScores::load(&store);
            let score = run.score.unwrap_or_default();
            match scores.potential_rank(score) {
                Some(rank) => println!("  Fuel score {score} makes the board at #{rank}"),
                None => println!("  Fuel score {score} is off the board"),
            }
            if scores.record_run("Explorer", run, now).is_some() {
                scores.save(&mut store);
            }
            for (i, entry) in scores.entries.iter().enumerate() {
                let age = format_age(entry.timestamp, now);
                println!("  {:>2}. {:<10} {:>6}  {age}", i + 1, entry.player, entry.score);
            }
        }
        log::debug!("success listener fired: {}", accomplished.get());
        runner.outcome().cloned().unwrap_or_default()
    }
}
