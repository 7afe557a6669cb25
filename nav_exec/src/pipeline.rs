//! # Navigation Pipeline
//!
//! The per-cycle fusion and navigation processing: build the occupancy grid from the cycle's
//! scan, binarise it, plan a path from the near-left to the near-right corner, and simulate the
//! alerts along that path.
//!
//! Every cycle is independent, nothing computed in one cycle is used in the next.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;
use std::path::PathBuf;

// Internal
use crate::auto::{
    alert::{AlertError, AlertSimulator},
    map::{BinaryMap, GridError, OccupancyGrid},
    nav::path_planner::{self, PlanError},
    Alert, Direction, NavParams, Path,
};
use crate::scan::ScanSample;
use util::{
    archive::{archive_time_s, ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Parameter file loaded when no explicit path is given.
pub const DEFAULT_PARAMS_FILE: &str = "nav.toml";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation pipeline state
#[derive(Default)]
pub struct NavPipeline {
    params: NavParams,

    alert_sim: AlertSimulator,

    num_cycles: u64,

    report: StatusReport,
    arch_report: Archiver,

    alerts: Vec<Alert>,
    arch_alerts: Archiver,
}

/// Input data to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// The scan for this cycle
    pub scan: Vec<ScanSample>,
}

/// Everything the pipeline produced this cycle.
#[derive(Debug, Clone, Serialize)]
pub struct OutputData {
    pub grid: OccupancyGrid,
    pub map: BinaryMap,

    /// The planned path, empty if the goal is unreachable
    pub path: Path,

    /// Alerts in path order
    pub alerts: Vec<Alert>,
}

/// Status report for pipeline processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    pub cycle: u64,
    pub num_samples: usize,
    pub num_valid_samples: usize,
    pub num_obstacle_cells: usize,
    pub path_length: usize,
    pub nodes_expanded: usize,
    pub goal_reached: bool,
    pub num_alert_evaluations: usize,
    pub num_alerts: usize,
}

/// A single alert as written to the alert archive.
#[derive(Serialize)]
struct AlertRecord<'a> {
    time_s: f64,
    cycle: u64,
    path_index: usize,
    row: usize,
    col: usize,
    direction: Direction,
    distance_m: f64,
    text: &'a str,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Could not load the navigation parameters: {0}")]
    ParamsError(params::LoadError),

    #[error("Invalid grid parameters: {0}")]
    GridError(#[from] GridError),

    #[error("Invalid alert parameters: {0}")]
    AlertError(#[from] AlertError),

    #[error("Path planning failed: {0}")]
    PlanError(#[from] PlanError),

    #[error("Could not create the archives: {0}")]
    ArchiveError(#[from] ArchiveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavPipeline {
    /// Create a pipeline with the given parameters which isn't archived.
    pub fn new(params: NavParams) -> Result<Self, PipelineError> {
        let mut pipeline = Self::default();
        pipeline.set_params(params)?;
        Ok(pipeline)
    }

    pub fn params(&self) -> &NavParams {
        &self.params
    }

    /// Number of cycles processed so far.
    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// Validate and apply a set of parameters.
    fn set_params(&mut self, params: NavParams) -> Result<(), PipelineError> {
        // Checks the grid size
        OccupancyGrid::empty(params.grid_width, params.grid_height)?;

        self.alert_sim = AlertSimulator::new(params.alert_params())?;
        self.params = params;

        Ok(())
    }
}

impl State for NavPipeline {
    type InitData = Option<PathBuf>;
    type InitError = PipelineError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = PipelineError;

    /// Initialise the pipeline.
    ///
    /// Expected init data is the path to the parameter file. If `None` the default parameter file
    /// is loaded from the parameters directory, falling back to the default parameters if it can't
    /// be loaded.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: NavParams = match init_data {
            Some(path) => params::load_from_path(&path).map_err(PipelineError::ParamsError)?,
            None => match params::load(DEFAULT_PARAMS_FILE) {
                Ok(p) => p,
                Err(e) => {
                    warn!(
                        "Could not load {}, using default navigation parameters: {}",
                        DEFAULT_PARAMS_FILE,
                        e
                    );
                    NavParams::default()
                }
            },
        };

        debug!("Navigation parameters: {:#?}", params);

        self.set_params(params)?;

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "nav/status_report.csv")?;
        self.arch_alerts = Archiver::from_path(session, "nav/alerts.csv")?;

        Ok(())
    }

    /// Perform one cycle of processing.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let scan = &input_data.scan;

        // Clear the status report
        self.report = StatusReport {
            cycle: self.num_cycles,
            num_samples: scan.len(),
            num_valid_samples: scan.iter().filter(|s| s.is_valid()).count(),
            ..Default::default()
        };
        self.num_cycles += 1;

        // ---- GRID ----

        let grid = OccupancyGrid::build(
            scan,
            self.params.grid_width,
            self.params.grid_height,
            self.params.fov_deg,
        )?;
        let map = grid.binarize(self.params.binarize_threshold);
        self.report.num_obstacle_cells = map.num_obstacles();

        // ---- PLANNING ----

        let (path, plan_report) = path_planner::plan_with_report(
            &map,
            self.params.start_cell(),
            self.params.goal_cell(),
        )?;
        self.report.path_length = path.len();
        self.report.nodes_expanded = plan_report.nodes_expanded;
        self.report.goal_reached = plan_report.goal_reached;

        // ---- ALERTS ----

        let (alerts, num_evaluated) = self.alert_sim.simulate(&map, &path, scan);
        self.report.num_alert_evaluations = num_evaluated;
        self.report.num_alerts = alerts.len();

        trace!("Pipeline status: {:?}", self.report);

        self.alerts = alerts.clone();

        Ok((
            OutputData {
                grid,
                map,
                path,
                alerts,
            },
            self.report,
        ))
    }
}

impl Archived for NavPipeline {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)?;

        let time_s = archive_time_s();
        for alert in self.alerts.iter() {
            self.arch_alerts.serialise(AlertRecord {
                time_s,
                cycle: self.report.cycle,
                path_index: alert.path_index,
                row: alert.cell.row,
                col: alert.cell.col,
                direction: alert.direction,
                distance_m: alert.distance_m,
                text: &alert.text,
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::map::GridCell;
    use crate::scan::{SimScanParams, SimScanSource};

    fn pipeline() -> NavPipeline {
        NavPipeline::new(NavParams::default()).unwrap()
    }

    #[test]
    fn test_empty_scan() {
        let mut p = pipeline();

        let (out, report) = p.proc(&InputData { scan: vec![] }).unwrap();

        // Everything is free, so the path runs straight along the bottom row
        assert_eq!(out.map.num_obstacles(), 0);
        assert_eq!(out.path.len(), 256);
        assert!(out.path.cells.iter().all(|c| c.row == 63));
        assert!(out.alerts.is_empty());

        assert_eq!(report.cycle, 0);
        assert_eq!(report.path_length, 256);
        assert!(report.goal_reached);
        assert_eq!(report.num_alert_evaluations, 52);
        assert_eq!(report.num_alerts, 0);
    }

    #[test]
    fn test_cycles_are_independent() {
        let mut p = pipeline();
        let sim = SimScanSource::new(SimScanParams::default()).unwrap();
        let scan = sim.scan_at(3);

        let (first, _) = p.proc(&InputData { scan: scan.clone() }).unwrap();
        p.proc(&InputData { scan: vec![] }).unwrap();
        let (again, report) = p.proc(&InputData { scan }).unwrap();

        assert_eq!(first.path, again.path);
        assert_eq!(first.alerts, again.alerts);
        assert_eq!(report.cycle, 2);
        assert_eq!(p.num_cycles(), 3);
    }

    #[test]
    fn test_sim_scan_outputs_consistent() {
        let mut p = pipeline();
        let sim = SimScanSource::new(SimScanParams::default()).unwrap();

        for cycle in 0..5 {
            let scan = sim.scan_at(cycle);
            let (out, report) = p.proc(&InputData { scan }).unwrap();

            assert_eq!(out.grid.width(), 256);
            assert_eq!(out.grid.height(), 64);
            assert_eq!(report.num_obstacle_cells, out.grid.num_occupied());

            if report.goal_reached {
                assert_eq!(out.path.first(), Some(&GridCell::new(63, 0)));
                assert_eq!(out.path.last(), Some(&GridCell::new(63, 255)));
                assert!(out.path.is_four_connected());
            } else {
                assert!(out.path.is_empty());
            }
            assert!(report.num_alerts <= report.num_alert_evaluations);
        }
    }

    #[test]
    fn test_near_wall_blocks_route() {
        // A sample in every column at the nearest rows, cutting the bottom edge off from the
        // rest of the grid
        let p_params = NavParams {
            grid_width: 16,
            grid_height: 8,
            ..Default::default()
        };
        let mut p = NavPipeline::new(p_params).unwrap();
        let scan: Vec<_> = (0..64)
            .map(|i| {
                let angle_deg = -29.9 + i as f64 * 59.8 / 63.0;
                ScanSample::new(angle_deg.to_radians(), 0.2)
            })
            .collect();

        let (out, report) = p.proc(&InputData { scan }).unwrap();

        // Every column of row 6 is blocked, but the bottom row is still clear
        assert!((0..16).all(|c| !out.map.is_free(GridCell::new(6, c))));
        assert!(report.goal_reached);
        assert_eq!(out.path.len(), 16);

        // Every sampled path cell sees the wall in its window
        assert_eq!(report.num_alerts, report.num_alert_evaluations);
        assert!(out.alerts.iter().all(|a| (a.distance_m - 0.2f64.powf(1.8) * 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_bad_params() {
        assert!(matches!(
            NavPipeline::new(NavParams {
                grid_width: 0,
                ..Default::default()
            }),
            Err(PipelineError::GridError(_))
        ));
        assert!(matches!(
            NavPipeline::new(NavParams {
                alert_stride: 0,
                ..Default::default()
            }),
            Err(PipelineError::AlertError(_))
        ));
    }

    #[test]
    fn test_archives_without_session() {
        let mut p = pipeline();
        p.proc(&InputData { scan: vec![] }).unwrap();

        assert!(p.write().is_ok());
    }
}
