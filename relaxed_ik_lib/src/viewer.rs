//! Collision viewer loop.
//!
//! Every tick scores one pre-sampled configuration, then publishes its joint
//! state, the world transform and an index marker so the drawn collision
//! state can be matched to its sample.

use crate::types::{
    Clock, ColorRgba, FixedJoint, Header, JointState, Marker, MarkerType, Position, RobotConfig, Scale,
    Stamp, TransformStamped, COMMON_WORLD_FRAME,
};
use crate::utils::collision::CollisionEvaluator;
use crate::utils::kinematics::RobotModel;
use crate::utils::sampling::sample_states;
use eyre::Result;
use tracing::{debug, warn};

/// Fixed list of sample states and a wrapping cursor into it.
#[derive(Debug, Clone)]
pub struct SampleCycler {
    samples: Vec<Vec<f64>>,
    index: usize,
}

impl SampleCycler {
    pub fn new(samples: Vec<Vec<f64>>) -> Result<Self> {
        if samples.is_empty() {
            return Err(eyre::eyre!("Sample state list is empty"));
        }
        Ok(Self { samples, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn current(&self) -> &[f64] {
        &self.samples[self.index]
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.samples.len();
    }
}

/// Robot-specific joint-state construction. `None` selects the plain
/// `joint_ordering` + state message.
pub trait JointStateDefine {
    fn define(&self, state: &[f64]) -> Option<JointState>;
}

impl<F> JointStateDefine for F
where
    F: Fn(&[f64]) -> Option<JointState>,
{
    fn define(&self, state: &[f64]) -> Option<JointState> {
        self(state)
    }
}

/// Appends constant joints (grippers, mimic joints) after the solved ones.
pub struct FixedJointPadding {
    joint_ordering: Vec<String>,
    fixed: Vec<FixedJoint>,
}

impl FixedJointPadding {
    pub fn new(joint_ordering: Vec<String>, fixed: Vec<FixedJoint>) -> Self {
        Self {
            joint_ordering,
            fixed,
        }
    }
}

impl JointStateDefine for FixedJointPadding {
    fn define(&self, state: &[f64]) -> Option<JointState> {
        if self.fixed.is_empty() {
            return None;
        }

        let mut js = JointState::from_positions(&self.joint_ordering, state);
        for joint in &self.fixed {
            js.name.push(joint.name.clone());
            js.position.push(joint.value);
        }
        Some(js)
    }
}

pub fn build_joint_state(
    define: &dyn JointStateDefine,
    joint_ordering: &[String],
    state: &[f64],
    stamp: Stamp,
) -> JointState {
    let mut js = define
        .define(state)
        .unwrap_or_else(|| JointState::from_positions(joint_ordering, state));
    js.update_stamp(stamp);
    js
}

/// Identity transform tying `common_world` to the robot's fixed frame.
pub fn world_transform(fixed_frame: &str, stamp: Stamp) -> TransformStamped {
    TransformStamped::identity(Header::new(stamp, fixed_frame), COMMON_WORLD_FRAME)
}

pub fn index_marker(index: usize, stamp: Stamp, offset: [f64; 3], scale: f64) -> Marker {
    let mut marker = Marker::new(Header::new(stamp, COMMON_WORLD_FRAME), MarkerType::TextViewFacing);
    marker.text = index.to_string();
    marker.scale = Scale::uniform(scale);
    marker.position = Position {
        x: offset[0],
        y: offset[1],
        z: offset[2],
    };
    marker.color = ColorRgba::new(0.0, 0.0, 0.0, 1.0);
    marker
}

/// Output channels of the viewer.
pub trait VizPublisher {
    fn publish_joint_state(&mut self, msg: &JointState) -> Result<()>;
    fn send_transform(&mut self, msg: &TransformStamped) -> Result<()>;
    fn publish_marker(&mut self, msg: &Marker) -> Result<()>;
    fn publish_collision_markers(&mut self, markers: &[Marker]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub index: usize,
    pub score: Option<f64>,
    pub stamp: Stamp,
}

pub struct VisualizationLoop<E: CollisionEvaluator, C: Clock> {
    cycler: SampleCycler,
    model: RobotModel,
    evaluator: E,
    clock: C,
    define: Box<dyn JointStateDefine>,
    fixed_frame: String,
    marker_offset: [f64; 3],
    marker_scale: f64,
}

impl<E: CollisionEvaluator, C: Clock> VisualizationLoop<E, C> {
    pub fn from_config(config: &RobotConfig, evaluator: E, clock: C) -> Result<Self> {
        config.validate()?;

        let cycler = SampleCycler::new(sample_states(config))?;
        let define = FixedJointPadding::new(
            config.joint_ordering.clone(),
            config.viewer.fixed_joints.clone(),
        );

        Ok(Self {
            cycler,
            model: RobotModel::new(config),
            evaluator,
            clock,
            define: Box::new(define),
            fixed_frame: config.fixed_frame.clone(),
            marker_offset: config.viewer.marker_offset,
            marker_scale: config.viewer.marker_scale,
        })
    }

    pub fn with_joint_state_define(mut self, define: Box<dyn JointStateDefine>) -> Self {
        self.define = define;
        self
    }

    pub fn cycler(&self) -> &SampleCycler {
        &self.cycler
    }

    /// Score, draw and publish the current sample, then move to the next one.
    ///
    /// Neither a scoring failure nor a failed publish stops the tick.
    pub fn tick(&mut self, publisher: &mut impl VizPublisher) -> TickReport {
        let index = self.cycler.index();
        let state = self.cycler.current().to_vec();

        let score = match self
            .model
            .frames(&state)
            .and_then(|frames| self.evaluator.collision_score(&frames))
        {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("Collision scoring failed for sample {}: {}", index, e);
                None
            }
        };
        let drawn = if score.is_some() {
            self.evaluator.draw()
        } else {
            Vec::new()
        };

        let now = self.clock.now();

        let js = build_joint_state(self.define.as_ref(), self.model.joint_ordering(), &state, now);
        if let Err(e) = publisher.publish_joint_state(&js) {
            warn!("Failed to publish joint state: {}", e);
        }

        let transform = world_transform(&self.fixed_frame, self.clock.now());
        if let Err(e) = publisher.send_transform(&transform) {
            warn!("Failed to send world transform: {}", e);
        }

        let marker = index_marker(index, now, self.marker_offset, self.marker_scale);
        if let Err(e) = publisher.publish_marker(&marker) {
            warn!("Failed to publish index marker: {}", e);
        }

        if !drawn.is_empty() {
            let stamped: Vec<Marker> = drawn
                .into_iter()
                .map(|mut m| {
                    m.header = Header::new(now, self.fixed_frame.clone());
                    m
                })
                .collect();
            if let Err(e) = publisher.publish_collision_markers(&stamped) {
                warn!("Failed to publish collision markers: {}", e);
            }
        }

        debug!("Sample {} collision score: {:?}", index, score);

        self.cycler.advance();

        TickReport {
            index,
            score,
            stamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::planar_config;
    use crate::utils::kinematics::Frames;
    use std::cell::Cell;

    /// Each read advances by one second.
    struct CountingClock(Cell<i64>);

    impl Clock for CountingClock {
        fn now(&self) -> Stamp {
            let secs = self.0.get() + 1;
            self.0.set(secs);
            Stamp::new(secs, 0)
        }
    }

    struct FakeEvaluator {
        fail_on_call: Option<usize>,
        calls: usize,
    }

    impl CollisionEvaluator for FakeEvaluator {
        fn collision_score(&mut self, frames: &Frames) -> Result<f64> {
            self.calls += 1;
            if self.fail_on_call == Some(self.calls) {
                return Err(eyre::eyre!("evaluator blew up"));
            }
            Ok(frames.len() as f64)
        }

        fn draw(&mut self) -> Vec<Marker> {
            vec![Marker::new(Header::default(), MarkerType::Sphere)]
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        joint_states: Vec<JointState>,
        transforms: Vec<TransformStamped>,
        markers: Vec<Marker>,
        collision_batches: Vec<Vec<Marker>>,
        fail_joint_states: bool,
    }

    impl VizPublisher for RecordingPublisher {
        fn publish_joint_state(&mut self, msg: &JointState) -> Result<()> {
            if self.fail_joint_states {
                return Err(eyre::eyre!("channel closed"));
            }
            self.joint_states.push(msg.clone());
            Ok(())
        }

        fn send_transform(&mut self, msg: &TransformStamped) -> Result<()> {
            self.transforms.push(msg.clone());
            Ok(())
        }

        fn publish_marker(&mut self, msg: &Marker) -> Result<()> {
            self.markers.push(msg.clone());
            Ok(())
        }

        fn publish_collision_markers(&mut self, markers: &[Marker]) -> Result<()> {
            self.collision_batches.push(markers.to_vec());
            Ok(())
        }
    }

    fn viewer_with_samples(count: usize, fail_on_call: Option<usize>) -> VisualizationLoop<FakeEvaluator, CountingClock> {
        let mut config = planar_config();
        config.viewer.sample_states = (0..count).map(|i| vec![i as f64 * 0.1, 0.0]).collect();
        let evaluator = FakeEvaluator {
            fail_on_call,
            calls: 0,
        };
        VisualizationLoop::from_config(&config, evaluator, CountingClock(Cell::new(0))).unwrap()
    }

    #[test]
    fn test_cycler_wraps() {
        let mut cycler = SampleCycler::new(vec![vec![0.0]; 5]).unwrap();
        let mut seen = Vec::new();
        for _ in 0..12 {
            seen.push(cycler.index());
            cycler.advance();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4, 0, 1]);
    }

    #[test]
    fn test_cycler_rejects_empty() {
        assert!(SampleCycler::new(Vec::new()).is_err());
    }

    #[test]
    fn test_index_after_n_ticks() {
        let mut viewer = viewer_with_samples(5, None);
        let mut publisher = RecordingPublisher::default();

        for n in 1..=23 {
            viewer.tick(&mut publisher);
            assert_eq!(viewer.cycler().index(), n % 5);
        }

        let texts: Vec<&str> = publisher.markers.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(&texts[..12], &["0", "1", "2", "3", "4", "0", "1", "2", "3", "4", "0", "1"]);
    }

    #[test]
    fn test_one_message_per_channel_with_shared_stamp() {
        let mut viewer = viewer_with_samples(3, None);
        let mut publisher = RecordingPublisher::default();

        let reports: Vec<TickReport> = (0..4).map(|_| viewer.tick(&mut publisher)).collect();

        assert_eq!(publisher.joint_states.len(), 4);
        assert_eq!(publisher.transforms.len(), 4);
        assert_eq!(publisher.markers.len(), 4);
        assert_eq!(publisher.collision_batches.len(), 4);

        for i in 0..4 {
            let js_stamp = publisher.joint_states[i].header.stamp;
            assert_eq!(reports[i].stamp, js_stamp);
            assert_eq!(publisher.markers[i].header.stamp, js_stamp);
            assert_eq!(publisher.collision_batches[i][0].header.stamp, js_stamp);
            // Transform takes its own clock read.
            assert_ne!(publisher.transforms[i].header.stamp, js_stamp);
        }
    }

    #[test]
    fn test_fallback_joint_state_and_messages() {
        let mut viewer = viewer_with_samples(2, None);
        let mut publisher = RecordingPublisher::default();
        viewer.tick(&mut publisher);
        viewer.tick(&mut publisher);

        let js = &publisher.joint_states[1];
        assert_eq!(js.name, vec!["shoulder".to_string(), "elbow".to_string()]);
        assert_eq!(js.position, vec![0.1, 0.0]);

        let tf = &publisher.transforms[0];
        assert_eq!(tf.header.frame_id, "base_link");
        assert_eq!(tf.child_frame_id, COMMON_WORLD_FRAME);
        assert_eq!(tf.rotation, crate::Orientation::identity());

        let marker = &publisher.markers[0];
        assert_eq!(marker.marker_type, MarkerType::TextViewFacing);
        assert_eq!(marker.header.frame_id, COMMON_WORLD_FRAME);
        assert_eq!(marker.position.x, -0.3);
        assert_eq!(marker.position.z, 0.3);
        assert_eq!(marker.scale.x, 0.1);
        assert_eq!(marker.color.a, 1.0);
    }

    #[test]
    fn test_custom_joint_state_define() {
        let define = |state: &[f64]| {
            Some(JointState::from_positions(&["both".to_string()], &[state[0] + state[1]]))
        };
        let mut viewer = viewer_with_samples(2, None).with_joint_state_define(Box::new(define));
        let mut publisher = RecordingPublisher::default();
        viewer.tick(&mut publisher);

        assert_eq!(publisher.joint_states[0].name, vec!["both".to_string()]);
        assert_eq!(publisher.joint_states[0].header.stamp, publisher.markers[0].header.stamp);
    }

    #[test]
    fn test_fixed_joint_padding() {
        let padding = FixedJointPadding::new(
            vec!["a".to_string()],
            vec![FixedJoint {
                name: "finger".to_string(),
                value: 0.02,
            }],
        );
        let js = padding.define(&[1.0]).unwrap();
        assert_eq!(js.name, vec!["a".to_string(), "finger".to_string()]);
        assert_eq!(js.position, vec![1.0, 0.02]);

        let empty = FixedJointPadding::new(vec!["a".to_string()], Vec::new());
        assert!(empty.define(&[1.0]).is_none());
    }

    #[test]
    fn test_evaluator_failure_still_advances() {
        let mut viewer = viewer_with_samples(3, Some(2));
        let mut publisher = RecordingPublisher::default();

        let first = viewer.tick(&mut publisher);
        let second = viewer.tick(&mut publisher);
        let third = viewer.tick(&mut publisher);

        assert_eq!(first.score, Some(1.0));
        assert_eq!(second.score, None);
        assert_eq!(third.index, 2);
        assert_eq!(publisher.markers.len(), 3);
        assert_eq!(publisher.collision_batches.len(), 2);
    }

    #[test]
    fn test_publish_failure_does_not_stop_tick() {
        let mut viewer = viewer_with_samples(3, None);
        let mut publisher = RecordingPublisher {
            fail_joint_states: true,
            ..Default::default()
        };

        viewer.tick(&mut publisher);

        assert!(publisher.joint_states.is_empty());
        assert_eq!(publisher.markers.len(), 1);
        assert_eq!(viewer.cycler().index(), 1);
    }
}
