//! Main trajectory generator executable entry point.
//! 
//! # Architecture
//! 
//! The general execution methodology consists of:
//! 
//!     - Initialise all modules
//!     - Main loop:
//!         - Wait for the next tick
//!         - Telecommand processing and handling
//!         - Simulation step:
//!             - Train control processing
//!             - Trajectory assembly and publication
//!         - Status reporting
//! 
//! # Usage
//! 
//! `traj_exec [script]` - with a script path the TCs are replayed from the script, otherwise
//! they are read from the console (e.g. `start`, `mode manual`, `notch t3`, `stop`).

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::net::{NetParams, TrajSocket};
use traj_lib::{
    assembler::Assembler,
    console::TcConsole,
    data_store::DataStore,
    params::ExecParams,
    route::Route,
    sim::{SimConfig, SimError, Simulator},
    tick::TickSource,
    train_ctrl::{self, TrainCtrl, VehicleParams}
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::env;
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use util::{
    host, 
    module::State,
    logger::{logger_init_with_filters, LevelFilter},
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingTcs},
    time::millis_since_wire_epoch
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "traj_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger, TrainCtrl traces every cycle so is kept at debug
    logger_init_with_filters(
        LevelFilter::Trace, 
        &[("traj_lib::train_ctrl", LevelFilter::Debug)],
        &session
    ).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Rail Trajectory Generator Executable\n");
    info!(
        "Running on: {:#?}", 
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams = util::params::load(
        "traj_exec.toml"
    ).wrap_err("Could not load exec params")?;

    let vehicle_params: VehicleParams = util::params::load(
        "vehicle.toml"
    ).wrap_err("Could not load vehicle params")?;

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let mut tc_source = match args.len() {
        // If we have a single argument use it as the script path
        2 => {
            info!("Loading script from \"{}\"", &args[1]);

            let si = ScriptInterpreter::new(
                &args[1]).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            TcSource::Script(si)
        },
        // If no arguments read TCs from the console
        1 => {
            info!("No script provided, TCs will be read from the console\n");
            TcSource::Console(TcConsole::interactive())
        },
        _ => return Err(eyre!(
            "Expected either zero or one argument, found {}", args.len() - 1)
        )
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let route_path = exec_params.route_path()
        .wrap_err("Cannot resolve the route file, is RAILTRAJ_SW_ROOT set?")?;
    let route = Route::load_file(&route_path)
        .wrap_err("Failed to load the route")?;

    let station_position_m = vehicle_params.station_position_m
        .unwrap_or_else(|| route.total_distance_m());
    info!(
        "Station at {:.3} m of {:.3} m", 
        station_position_m, 
        route.total_distance_m()
    );

    let mut train_ctrl = TrainCtrl::default();
    train_ctrl.init(
        train_ctrl::InitData {
            vehicle: vehicle_params.clone(),
            station_position_m
        }, 
        &session
    ).wrap_err("Failed to initialise TrainCtrl")?;
    train_ctrl.set_mode(exec_params.initial_mode);
    info!("TrainCtrl init complete");

    let mut tick_source = TickSource::from_millis(exec_params.cycle_period_ms)
        .wrap_err("Invalid cycle period")?;

    let mut assembler = Assembler::new(
        &exec_params.slot, 
        vehicle_params.length_m, 
        tick_source.period_s()
    ).wrap_err("Failed to initialise the Assembler")?;
    assembler.open_archive(&session)
        .wrap_err("Failed to open the Assembler archive")?;
    info!("Assembler init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    let socket = TrajSocket::new(&net_params)
        .wrap_err("Failed to initialise the TrajSocket")?;
    info!("Publishing trajectories to {}", net_params.dest_addr);

    // ---- INITIALISE SIMULATOR ----

    let start_time_ms = match exec_params.start_time_ms {
        Some(t) => t,
        None => millis_since_wire_epoch(chrono::Utc::now())
    };

    let mut sim = Simulator::new(route, train_ctrl, assembler, socket, SimConfig {
        dt_s: tick_source.period_s(),
        start_time_ms,
        duration_s: exec_params.duration_s
    });

    if exec_params.auto_start {
        sim.start().wrap_err("Failed to start the simulation")?;
    }

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut ds = DataStore::default();

    loop {

        tick_source.wait();
        ds.cycle_start(tick_source.frequency_hz(), tick_source.period_s());

        // ---- TELECOMMAND PROCESSING ----

        match tc_source {
            TcSource::Console(ref mut console) => {
                for tc in console.pending_tcs().iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            },
            TcSource::Script(ref mut si) => 
                match si.get_pending_tcs(ds.exec_time_s) {
                    PendingTcs::None => (),
                    PendingTcs::Some(tc_vec) => {
                        for tc in tc_vec.iter() {
                            tc_processor::exec(&mut ds, tc);
                        }
                    }
                    // Exit if end of script reached
                    PendingTcs::EndOfScript => {
                        info!("End of TC script reached, stopping");
                        break
                    }
                }
        };

        if ds.stop_requested {
            info!("Stop TC received");
            break
        }

        if ds.start_requested {
            sim.start().wrap_err("Failed to start the simulation")?;
        }

        // ---- SIMULATION ----

        match sim.step(&ds.train_ctrl_input) {
            Ok(_) => (),
            // A lost datagram isn't fatal, the next cycle carries the new state
            Err(SimError::TransportError(e)) => warn!("Could not publish trajectory: {}", e),
            Err(e) => return Err(e).wrap_err("Simulation step failed")
        }

        // ---- STATUS ----

        if ds.is_1_hz_cycle && sim.is_running() {
            let state = sim.current_state();
            let report = sim.report();
            let geo = sim.geodetic_position();

            info!(
                "{:?} {:?} {:?}: s = {:.1} m, v = {:.2} km/h, a = {:.3} m/s^2, \
                {:.1} m to station, ({:.6}, {:.6}, {:.1})",
                report.mode,
                report.run_state,
                report.notch,
                state.position_m,
                sim.speed_ms() * 3.6,
                state.accel_mss,
                report.dist_to_station_m,
                geo.lon_deg,
                geo.lat_deg,
                geo.alt_m
            );
        }

        if sim.is_finished() {
            info!("Simulation duration of {:.1} s reached", exec_params.duration_s);
            break
        }

        if let TcSource::Console(ref console) = tc_source {
            if !console.is_connected() && !sim.is_running() {
                info!("Console closed with the simulation stopped");
                break
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    sim.stop().wrap_err("Failed to stop the simulation")?;

    info!(
        "{} steps published, {} cycle overruns", 
        sim.num_steps(), 
        tick_source.num_overruns()
    );
    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    Console(TcConsole),
    Script(ScriptInterpreter)
}
