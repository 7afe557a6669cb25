//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Input acquisition, one frame and the scan derived from it
//!         - Object detection on the frame
//!         - Navigation pipeline processing:
//!             - Occupancy grid building and binarisation
//!             - Path planning
//!             - Alert simulation
//!         - Speaking the alerts
//!         - Rendering, archiving and snapshot saving
//!
//! # Modules
//!
//! All cyclic modules (e.g. `pipeline`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use nav_lib::{
    detect::{filter_detections, Detection, Detector, NullDetector},
    frame_source::DirFrameSource,
    params::NavExecParams,
    pipeline::{InputData, NavPipeline},
    render::{RenderInput, SessionRenderer},
    scan::{
        CamScanSource, PseudoLidar, PseudoLidarParams, ScanError, ScanSource, SimScanParams,
        SimScanSource,
    },
    speech::{LogSpeech, SpeechSink},
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Executable parameter file loaded when none is given on the command line.
const EXEC_PARAMS_FILE: &str = "nav_exec.toml";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Obstacle-alerting navigation assistant.
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec")]
struct Opt {
    /// Navigation parameter file, defaults to `nav.toml` in the parameters directory
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Executable parameter file, defaults to `nav_exec.toml` in the parameters directory
    #[structopt(long, parse(from_os_str))]
    exec_params: Option<PathBuf>,

    /// Replay camera frames from this directory
    #[structopt(long, parse(from_os_str), conflicts_with = "sim")]
    frames: Option<PathBuf>,

    /// Use synthetic scans instead of camera frames
    #[structopt(long)]
    sim: bool,

    /// Seed of the synthetic scans, overrides the parameter file
    #[structopt(long)]
    seed: Option<u32>,

    /// Stop after this many cycles
    #[structopt(long)]
    cycles: Option<u64>,

    /// Only log alerts rather than speaking them
    #[structopt(long)]
    no_speech: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session, in the software root if it's set or the working directory otherwise
    let sessions_dir = match host::get_sw_root() {
        Ok(root) => root.join("sessions"),
        Err(_) => PathBuf::from("sessions"),
    };
    let session =
        Session::new_in("nav_exec", &sessions_dir).wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = match opt.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Blind Navigation Executable\n");
    info!("Running on: {}", host::get_platform());
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: NavExecParams = match opt.exec_params {
        Some(ref path) => util::params::load_from_path(path)
            .wrap_err_with(|| format!("Could not load exec params from {:?}", path))?,
        None => match util::params::load(EXEC_PARAMS_FILE) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    "Could not load {}, using default exec parameters: {}",
                    EXEC_PARAMS_FILE, e
                );
                NavExecParams::default()
            }
        },
    };

    if !exec_params.cycle_period_s.is_finite() || exec_params.cycle_period_s <= 0.0 {
        return Err(eyre!(
            "Cycle period must be a positive number of seconds (got {})",
            exec_params.cycle_period_s
        ));
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut pipeline = NavPipeline::default();
    pipeline
        .init(opt.params.clone(), &session)
        .wrap_err("Failed to initialise the NavPipeline")?;
    info!("NavPipeline init complete");

    let nav_params = pipeline.params().clone();

    let mut scan_source: Box<dyn ScanSource> = match (&opt.frames, opt.sim) {
        (Some(dir), _) => {
            let frames = DirFrameSource::new(
                dir,
                exec_params.frame_width,
                exec_params.frame_height,
            )
            .wrap_err("Failed to open the frame directory")?;
            let lidar = PseudoLidar::new(PseudoLidarParams {
                scan_line_ratio: exec_params.scan_line_ratio,
                fov_deg: nav_params.fov_deg,
            })
            .wrap_err("Failed to initialise the PseudoLidar")?;

            Box::new(CamScanSource::new(frames, lidar))
        }
        (None, true) => {
            let mut sim_params = SimScanParams {
                fov_deg: nav_params.fov_deg,
                ..exec_params.sim.clone()
            };
            if let Some(seed) = opt.seed {
                sim_params.seed = seed;
            }

            Box::new(
                SimScanSource::new(sim_params).wrap_err("Failed to initialise the SimScanSource")?,
            )
        }
        (None, false) => return Err(eyre!("Either --frames <dir> or --sim must be given")),
    };
    info!("Scan source init complete");

    let mut detector = NullDetector;

    let mut speech = speech_sink(&opt, &exec_params);

    let renderer = SessionRenderer::new(
        session.session_root.join("render"),
        exec_params.render_interval_cycles,
        exec_params.display_width,
        exec_params.display_height,
    )
    .wrap_err("Failed to initialise the SessionRenderer")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let mut num_cycles: u64 = 0;

    loop {
        if let Some(max) = opt.cycles {
            if num_cycles >= max {
                info!("Reached {} cycles, stopping", max);
                break;
            }
        }

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- DATA INPUT ----

        let input = match scan_source.next_scan() {
            Ok(i) => Some(i),
            Err(ScanError::EndOfStream) => {
                info!("End of input reached, stopping");
                break;
            }
            Err(e) => {
                warn!("Could not acquire a scan: {}", e);
                None
            }
        };

        if let Some(input) = input {
            // ---- DETECTION ----

            let detections: Vec<Detection> = match input.frame {
                Some(ref frame) => match detector.detect(frame) {
                    Ok(raw) => filter_detections(&raw, &exec_params.detection),
                    Err(e) => {
                        warn!("Detection failed: {}", e);
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };
            for det in detections.iter() {
                info!(
                    "Detected {} ({:.2}) at {:?}",
                    det.label, det.confidence, det.bbox
                );
            }

            // ---- NAVIGATION PROCESSING ----

            match pipeline.proc(&InputData { scan: input.scan }) {
                Ok((output, report)) => {
                    debug!(
                        "Cycle {}: path of {} cells, {} alerts",
                        report.cycle, report.path_length, report.num_alerts
                    );

                    // ---- SPEECH ----

                    for alert in output.alerts.iter() {
                        if let Err(e) = speech.announce(&alert.text) {
                            warn!("Could not announce alert: {}", e);
                        }
                    }

                    // ---- RENDERING ----

                    let render_input = RenderInput {
                        intensities: output.grid.data(),
                        map: &output.map,
                        path: &output.path,
                        frame: input.frame.as_ref().map(|f| &f.image),
                        detections: &detections,
                    };
                    if let Err(e) = renderer.render(num_cycles, &render_input) {
                        warn!("Could not render cycle {}: {}", num_cycles, e);
                    }

                    // ---- WRITE ARCHIVES ----

                    if let Err(e) = pipeline.write() {
                        warn!("Could not write the pipeline archives: {}", e);
                    }

                    if exec_params.save_interval_cycles > 0
                        && num_cycles % exec_params.save_interval_cycles == 0
                    {
                        session.save(format!("nav/output_{:06}.json", num_cycles), output);
                    }
                }
                Err(e) => warn!("Error during NavPipeline processing: {}", e),
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }

        // Increment cycle counter
        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    // Drop the speech engine first so queued announcements are finished
    drop(speech);

    session.exit();

    info!("End of execution");

    Ok(())
}

/// Create the speech sink, which only logs if speech is disabled or the engine can't be started.
#[cfg(feature = "espeak")]
fn speech_sink(opt: &Opt, params: &NavExecParams) -> Box<dyn SpeechSink> {
    use nav_lib::speech::EspeakSpeech;

    if opt.no_speech {
        info!("Speech disabled, alerts will be logged");
        return Box::new(LogSpeech::default());
    }

    match EspeakSpeech::new(&params.speech_command, &params.speech_voice) {
        Ok(s) => Box::new(s),
        Err(e) => {
            warn!("{}, alerts will be logged instead", e);
            Box::new(LogSpeech::default())
        }
    }
}

/// Create the speech sink, which only logs as speech support isn't built in.
#[cfg(not(feature = "espeak"))]
fn speech_sink(opt: &Opt, _params: &NavExecParams) -> Box<dyn SpeechSink> {
    if !opt.no_speech {
        info!("Built without speech support, alerts will be logged");
    }

    Box::new(LogSpeech::default())
}
