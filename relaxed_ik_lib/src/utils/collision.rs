use crate::types::{CollisionConfig, ColorRgba, Header, Marker, MarkerType, Position, Scale};
use crate::utils::kinematics::Frames;
use eyre::Result;
use nalgebra::Vector3;

/// Scores a set of forward-kinematics frames for self-collision.
///
/// Scoring and drawing are two calls: `draw` renders whatever the last
/// `collision_score` saw, so the viewer can skip drawing in tests.
pub trait CollisionEvaluator {
    fn collision_score(&mut self, frames: &Frames) -> Result<f64>;
    fn draw(&mut self) -> Vec<Marker>;
}

#[derive(Debug, Clone)]
struct Sphere {
    center: Vector3<f64>,
    chain: usize,
    link: usize,
    in_contact: bool,
}

/// One sphere per joint origin; overlapping spheres add a squared
/// penetration penalty.
pub struct LinkProximityEvaluator {
    radius: f64,
    skip_adjacent: usize,
    spheres: Vec<Sphere>,
}

impl LinkProximityEvaluator {
    pub fn new(config: &CollisionConfig) -> Self {
        Self {
            radius: config.link_radius,
            skip_adjacent: config.skip_adjacent,
            spheres: Vec::new(),
        }
    }

    fn is_checked_pair(&self, a: &Sphere, b: &Sphere) -> bool {
        if a.chain == b.chain && a.link.abs_diff(b.link) <= self.skip_adjacent {
            return false;
        }
        // Coincident origins are the same physical joint (shared base, zero-length links).
        (a.center - b.center).norm() > 1e-9
    }
}

impl CollisionEvaluator for LinkProximityEvaluator {
    fn collision_score(&mut self, frames: &Frames) -> Result<f64> {
        if self.radius <= 0.0 {
            return Err(eyre::eyre!("Link radius must be positive, got {}", self.radius));
        }

        self.spheres = frames
            .iter()
            .enumerate()
            .flat_map(|(chain, chain_frames)| {
                chain_frames
                    .positions
                    .iter()
                    .enumerate()
                    .map(move |(link, center)| Sphere {
                        center: *center,
                        chain,
                        link,
                        in_contact: false,
                    })
            })
            .collect();

        let contact_distance = 2.0 * self.radius;
        let mut score = 0.0;

        for i in 0..self.spheres.len() {
            for j in (i + 1)..self.spheres.len() {
                if !self.is_checked_pair(&self.spheres[i], &self.spheres[j]) {
                    continue;
                }
                let distance = (self.spheres[i].center - self.spheres[j].center).norm();
                if distance < contact_distance {
                    let penetration = (contact_distance - distance) / contact_distance;
                    score += penetration * penetration;
                    self.spheres[i].in_contact = true;
                    self.spheres[j].in_contact = true;
                }
            }
        }

        Ok(score)
    }

    fn draw(&mut self) -> Vec<Marker> {
        self.spheres
            .iter()
            .enumerate()
            .map(|(id, sphere)| {
                let mut marker = Marker::new(Header::default(), MarkerType::Sphere);
                marker.ns = "collision".to_string();
                marker.id = id as i32;
                marker.position = Position {
                    x: sphere.center.x,
                    y: sphere.center.y,
                    z: sphere.center.z,
                };
                marker.scale = Scale::uniform(2.0 * self.radius);
                marker.color = if sphere.in_contact {
                    ColorRgba::new(1.0, 0.0, 0.0, 0.8)
                } else {
                    ColorRgba::new(0.0, 1.0, 0.0, 0.4)
                };
                marker
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::kinematics::ChainFrames;
    use nalgebra::UnitQuaternion;

    fn chain(points: &[[f64; 3]]) -> ChainFrames {
        ChainFrames {
            positions: points.iter().map(|p| Vector3::new(p[0], p[1], p[2])).collect(),
            rotations: vec![UnitQuaternion::identity(); points.len()],
        }
    }

    fn evaluator() -> LinkProximityEvaluator {
        LinkProximityEvaluator::new(&CollisionConfig {
            link_radius: 0.05,
            skip_adjacent: 1,
        })
    }

    #[test]
    fn test_straight_chain_is_free() {
        let mut eval = evaluator();
        let frames = vec![chain(&[[0.0, 0.0, 0.0], [0.3, 0.0, 0.0], [0.6, 0.0, 0.0]])];

        assert_eq!(eval.collision_score(&frames).unwrap(), 0.0);
        let markers = eval.draw();
        assert_eq!(markers.len(), 3);
        assert!(markers.iter().all(|m| m.color.g > 0.0));
    }

    #[test]
    fn test_folded_chain_collides() {
        let mut eval = evaluator();
        // Tip folds back next to the base.
        let frames = vec![chain(&[[0.0, 0.0, 0.0], [0.3, 0.0, 0.0], [0.02, 0.05, 0.0]])];

        let score = eval.collision_score(&frames).unwrap();
        assert!(score > 0.0);

        let markers = eval.draw();
        assert_eq!(markers[0].color.r, 1.0);
        assert_eq!(markers[1].color.r, 0.0);
        assert_eq!(markers[2].color.r, 1.0);
    }

    #[test]
    fn test_adjacent_links_ignored() {
        let mut eval = evaluator();
        let frames = vec![chain(&[[0.0, 0.0, 0.0], [0.01, 0.0, 0.0]])];
        assert_eq!(eval.collision_score(&frames).unwrap(), 0.0);
    }

    #[test]
    fn test_shared_base_across_chains_ignored() {
        let mut eval = evaluator();
        let frames = vec![
            chain(&[[0.0, 0.0, 0.0], [0.3, 0.0, 0.0]]),
            chain(&[[0.0, 0.0, 0.0], [-0.3, 0.0, 0.0]]),
        ];
        assert_eq!(eval.collision_score(&frames).unwrap(), 0.0);
    }
}
