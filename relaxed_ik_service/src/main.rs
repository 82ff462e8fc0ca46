use dora_node_api::{
    arrow::array::{Array, BinaryArray},
    dora_core::config::DataId,
    DoraNode, Event,
};
use eyre::Result;
use relaxed_ik_lib::{init_tracing, DampedLeastSquaresSolver, RobotConfig, SolveService};
use std::error::Error;
use tracing::{debug, error, info, warn};

fn load_solver() -> Result<DampedLeastSquaresSolver> {
    let config_path =
        std::env::var("RELAXED_IK_CONFIG").unwrap_or_else(|_| "config/ur5.toml".to_string());

    let config = RobotConfig::load_from_file(&config_path)
        .map_err(|e| eyre::eyre!("Failed to load robot config from {}: {}", config_path, e))?;

    info!(
        "Loaded robot {}: {} DOF, {} kinematic chains",
        config.name,
        config.dof(),
        config.num_chains()
    );

    DampedLeastSquaresSolver::new(&config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let _guard = init_tracing("info");

    info!("==== Loading Relaxed IK Solver ====");

    // A missing or broken config leaves the service up but uninitialized.
    let solver = match load_solver() {
        Ok(solver) => Some(solver),
        Err(e) => {
            error!("Solver initialization failed: {}", e);
            None
        }
    };
    let mut service = SolveService::new(solver);

    let (mut node, mut events) = DoraNode::init_from_env()?;
    let output_id = DataId::from("solve_response".to_owned());

    info!("==== Ready for ik point requests ({:?}) ====", service.state());

    while let Some(event) = events.recv() {
        match event {
            Event::Input {
                id,
                metadata: _,
                data,
            } => match id.as_str() {
                "solve_request" => {
                    // Every request is answered, even one without a usable payload.
                    let payload = match data.as_any().downcast_ref::<BinaryArray>() {
                        Some(array) if array.len() > 0 => Some(array.value(0)),
                        Some(_) => None,
                        None => {
                            warn!("solve_request is not a binary array");
                            None
                        }
                    };
                    let response = service.handle_payload(payload);

                    let serialized = serde_json::to_vec(&response)?;
                    let arrow_data = BinaryArray::from_vec(vec![serialized.as_slice()]);

                    if let Err(e) = node.send_output(output_id.clone(), Default::default(), arrow_data) {
                        warn!("Failed to send solve response: {}", e);
                    } else {
                        debug!("Sent solve response (success: {})", response.is_success());
                    }
                }
                other => {
                    debug!("Unknown input id: {}", other);
                }
            },

            Event::Stop { .. } => {
                info!("Stop event received");
                break;
            }

            _ => {}
        }
    }

    info!("Relaxed IK service shutting down");
    Ok(())
}
