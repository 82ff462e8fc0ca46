use dora_node_api::{arrow::array::BinaryArray, dora_core::config::DataId, DoraNode, Event};
use eyre::Result;
use relaxed_ik_lib::{
    init_tracing, JointState, LinkProximityEvaluator, Marker, RobotConfig, SystemClock,
    TransformStamped, VisualizationLoop, VizPublisher,
};
use serde::Serialize;
use tracing::{debug, info};

/// Sends every viewer message as JSON on its own dora output.
struct DoraPublisher<'a> {
    node: &'a mut DoraNode,
}

impl DoraPublisher<'_> {
    fn send_json<T: Serialize + ?Sized>(&mut self, output: &str, msg: &T) -> Result<()> {
        let serialized = serde_json::to_vec(msg)?;
        let arrow_data = BinaryArray::from_vec(vec![serialized.as_slice()]);
        self.node
            .send_output(DataId::from(output.to_owned()), Default::default(), arrow_data)
    }
}

impl VizPublisher for DoraPublisher<'_> {
    fn publish_joint_state(&mut self, msg: &JointState) -> Result<()> {
        self.send_json("joint_states", msg)
    }

    fn send_transform(&mut self, msg: &TransformStamped) -> Result<()> {
        self.send_json("tf", msg)
    }

    fn publish_marker(&mut self, msg: &Marker) -> Result<()> {
        self.send_json("visualization_marker", msg)
    }

    fn publish_collision_markers(&mut self, markers: &[Marker]) -> Result<()> {
        self.send_json("collision_markers", markers)
    }
}

fn main() -> Result<()> {
    let _guard = init_tracing("info");

    info!("Starting collision viewer node");

    let config_path =
        std::env::var("RELAXED_IK_CONFIG").unwrap_or_else(|_| "config/ur5.toml".to_string());
    let config = RobotConfig::load_from_file(&config_path)
        .map_err(|e| eyre::eyre!("Failed to load robot config from {}: {}", config_path, e))?;

    let evaluator = LinkProximityEvaluator::new(&config.collision);
    let mut viewer = VisualizationLoop::from_config(&config, evaluator, SystemClock)?;

    // The dataflow timer wired to `tick` sets the rate.
    info!(
        "Cycling {} sample states of {}, one per tick input",
        viewer.cycler().len(),
        config.name
    );

    let (mut node, mut events) = DoraNode::init_from_env()?;
    let mut publisher = DoraPublisher { node: &mut node };

    while let Some(event) = events.recv() {
        match event {
            Event::Input { id, .. } => {
                if id.as_str() == "tick" {
                    let report = viewer.tick(&mut publisher);
                    info!(
                        "Sample {}/{} at {} ms, collision score: {}",
                        report.index,
                        viewer.cycler().len(),
                        report.stamp.as_millis(),
                        report
                            .score
                            .map(|s| format!("{:.4}", s))
                            .unwrap_or_else(|| "n/a".to_string())
                    );
                } else {
                    debug!("Unknown input id: {}", id.as_str());
                }
            }
            Event::Stop { .. } => {
                info!("Received stop event");
                break;
            }
            _ => {}
        }
    }

    info!("Collision viewer shutting down");
    Ok(())
}
