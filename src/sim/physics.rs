//! rapier2d adapter
//!
//! Owns the rigid-body world: walls, gravity, bodies and the fixed step.
//! It hands out body handles and reports newly touching body pairs, but it
//! never knows which game piece a body belongs to; callers resolve handles
//! back to pieces themselves.
//!
//! Coordinates are field pixels with y growing downward, so gravity is +y.
//!
//! Every operation fails with [`GameError::PhysicsNotInitialized`] until
//! [`PhysicsWorld::init`] has built the walls, and again after
//! [`PhysicsWorld::teardown`].

use std::collections::HashSet;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::error::{GameError, Result};
use crate::settings::Tuning;

/// Two bodies that started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyPair {
    pub a: RigidBodyHandle,
    pub b: RigidBodyHandle,
}

impl BodyPair {
    /// Order-independent pair (lower raw handle first)
    pub fn new(a: RigidBodyHandle, b: RigidBodyHandle) -> Self {
        if a.into_raw_parts() <= b.into_raw_parts() {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.a == handle || self.b == handle
    }
}

/// Axis-aligned wall rectangle, for drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallRect {
    pub center: Vec2,
    pub half_extents: Vec2,
}

/// The three static walls bounding the play zone (none around staging)
#[derive(Debug, Clone)]
pub struct Walls {
    pub floor: RigidBodyHandle,
    pub left: RigidBodyHandle,
    pub right: RigidBodyHandle,
    pub rects: [WallRect; 3],
}

impl Walls {
    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        handle == self.floor || handle == self.left || handle == self.right
    }
}

/// Description of a circular body to add
#[derive(Debug, Clone, Copy)]
pub struct CircleBody {
    pub pos: Vec2,
    pub radius: f32,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Staged bodies are kinematic and collide with nothing
    pub staged: bool,
}

/// Snapshot of a body's motion after a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
}

#[inline]
fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// rapier2d simulation state
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    walls: Option<Walls>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create an empty, uninitialized world
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, 0.0],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            walls: None,
        }
    }

    /// Build gravity and the wall set for a field. Any previous world is
    /// discarded first; walls are only ever recreated wholesale.
    pub fn init(&mut self, tuning: &Tuning) {
        self.teardown();

        self.gravity = vector![0.0, tuning.gravity];
        self.integration_params.dt = 1.0 / tuning.step_hz;
        // Pixel-scale world: tolerances in px rather than metres
        self.integration_params.length_unit = 100.0;

        let width = tuning.field_width;
        let height = tuning.field_height();
        let boundary = tuning.zone_boundary();
        let half_t = tuning.wall_thickness / 2.0;
        let side_half_h = (height - boundary) / 2.0;
        let side_center_y = boundary + side_half_h;

        let rects = [
            WallRect {
                center: Vec2::new(width / 2.0, height),
                half_extents: Vec2::new(width / 2.0, half_t),
            },
            WallRect {
                center: Vec2::new(0.0, side_center_y),
                half_extents: Vec2::new(half_t, side_half_h),
            },
            WallRect {
                center: Vec2::new(width, side_center_y),
                half_extents: Vec2::new(half_t, side_half_h),
            },
        ];
        let [floor, left, right] =
            rects.map(|rect| self.insert_wall(rect, tuning.restitution, tuning.friction));

        self.walls = Some(Walls {
            floor,
            left,
            right,
            rects,
        });
        log::debug!("Physics initialized: {}x{} field, boundary at y={}", width, height, boundary);
    }

    fn insert_wall(&mut self, rect: WallRect, restitution: f32, friction: f32) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(to_vector(rect.center))
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(rect.half_extents.x, rect.half_extents.y)
            .restitution(restitution)
            .friction(friction)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Detach every body and forget the walls. The world must be
    /// re-initialized before further use.
    pub fn teardown(&mut self) {
        let handles: Vec<RigidBodyHandle> = self.rigid_body_set.iter().map(|(h, _)| h).collect();
        for handle in handles {
            self.rigid_body_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }
        self.broad_phase = DefaultBroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.island_manager = IslandManager::new();
        self.walls = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.walls.is_some()
    }

    fn ensure_init(&self) -> Result<()> {
        if self.walls.is_some() {
            Ok(())
        } else {
            Err(GameError::PhysicsNotInitialized)
        }
    }

    pub fn walls(&self) -> Result<&Walls> {
        self.walls.as_ref().ok_or(GameError::PhysicsNotInitialized)
    }

    pub fn is_wall(&self, handle: RigidBodyHandle) -> bool {
        self.walls.as_ref().is_some_and(|w| w.contains(handle))
    }

    /// Add a circular body
    pub fn add_circle(&mut self, desc: CircleBody) -> Result<RigidBodyHandle> {
        self.ensure_init()?;
        let builder = if desc.staged {
            RigidBodyBuilder::kinematic_position_based()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let handle = self
            .rigid_body_set
            .insert(builder.translation(to_vector(desc.pos)).build());
        let groups = if desc.staged {
            InteractionGroups::none()
        } else {
            InteractionGroups::all()
        };
        let collider = ColliderBuilder::ball(desc.radius)
            .density(desc.density)
            .restitution(desc.restitution)
            .friction(desc.friction)
            .collision_groups(groups)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        Ok(handle)
    }

    /// Remove a body and its collider. Removing an unknown handle is a no-op.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> Result<()> {
        self.ensure_init()?;
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        Ok(())
    }

    /// Toggle between immovable (kinematic) and simulated (dynamic)
    pub fn set_kinematic(&mut self, handle: RigidBodyHandle, kinematic: bool) -> Result<()> {
        self.ensure_init()?;
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return Ok(());
        };
        let body_type = if kinematic {
            RigidBodyType::KinematicPositionBased
        } else {
            RigidBodyType::Dynamic
        };
        body.set_body_type(body_type, true);
        body.set_linvel(vector![0.0, 0.0], true);
        body.set_angvel(0.0, true);
        Ok(())
    }

    /// Enable or disable all collisions for a body's colliders
    pub fn set_collisions(&mut self, handle: RigidBodyHandle, enabled: bool) -> Result<()> {
        self.ensure_init()?;
        let colliders: Vec<ColliderHandle> = match self.rigid_body_set.get(handle) {
            Some(body) => body.colliders().to_vec(),
            None => return Ok(()),
        };
        let groups = if enabled {
            InteractionGroups::all()
        } else {
            InteractionGroups::none()
        };
        for ch in colliders {
            if let Some(collider) = self.collider_set.get_mut(ch) {
                collider.set_collision_groups(groups);
            }
        }
        Ok(())
    }

    pub fn set_position(&mut self, handle: RigidBodyHandle, pos: Vec2) -> Result<()> {
        self.ensure_init()?;
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(to_vector(pos), true);
        }
        Ok(())
    }

    pub fn body_state(&self, handle: RigidBodyHandle) -> Option<BodyState> {
        self.rigid_body_set.get(handle).map(|body| BodyState {
            pos: from_vector(body.translation()),
            vel: from_vector(body.linvel()),
            angle: body.rotation().angle(),
        })
    }

    pub fn is_kinematic(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(handle)
            .is_some_and(|body| body.is_kinematic())
    }

    /// Number of bodies, walls included
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Advance one fixed step, returning each newly touching body pair once
    pub fn step(&mut self) -> Result<Vec<BodyPair>> {
        self.ensure_init()?;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let a = self.collider_set.get(h1).and_then(|c| c.parent());
                let b = self.collider_set.get(h2).and_then(|c| c.parent());
                if let (Some(a), Some(b)) = (a, b) {
                    let pair = BodyPair::new(a, b);
                    if seen.insert(pair) {
                        pairs.push(pair);
                    }
                }
            }
        }
        // Channel order is not guaranteed; sort for reproducible resolution
        pairs.sort_by_key(|p| (p.a.into_raw_parts(), p.b.into_raw_parts()));
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(pos: Vec2, staged: bool) -> CircleBody {
        CircleBody {
            pos,
            radius: 20.0,
            density: 1.0,
            restitution: 0.25,
            friction: 0.5,
            staged,
        }
    }

    #[test]
    fn test_uninitialized_world_fails_fast() {
        let mut world = PhysicsWorld::new();
        assert!(matches!(world.step(), Err(GameError::PhysicsNotInitialized)));
        assert!(matches!(
            world.add_circle(circle(Vec2::new(100.0, 100.0), false)),
            Err(GameError::PhysicsNotInitialized)
        ));
    }

    #[test]
    fn test_init_builds_three_walls() {
        let mut world = PhysicsWorld::new();
        world.init(&Tuning::default());
        assert_eq!(world.body_count(), 3);
        let walls = world.walls().unwrap().clone();
        assert!(world.is_wall(walls.floor));
        // Side walls cover only the play zone
        let left = walls.rects[1];
        assert_eq!(left.center.y - left.half_extents.y, 140.0);
    }

    #[test]
    fn test_teardown_detaches_everything() {
        let mut world = PhysicsWorld::new();
        world.init(&Tuning::default());
        world.add_circle(circle(Vec2::new(100.0, 300.0), false)).unwrap();
        world.teardown();
        assert_eq!(world.body_count(), 0);
        assert!(!world.is_initialized());
        assert!(world.step().is_err());
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = PhysicsWorld::new();
        world.init(&Tuning::default());
        let h = world.add_circle(circle(Vec2::new(100.0, 200.0), false)).unwrap();
        for _ in 0..10 {
            world.step().unwrap();
        }
        assert!(world.body_state(h).unwrap().pos.y > 200.0);
    }

    #[test]
    fn test_staged_body_stays_put() {
        let mut world = PhysicsWorld::new();
        world.init(&Tuning::default());
        let h = world.add_circle(circle(Vec2::new(100.0, 100.0), true)).unwrap();
        for _ in 0..10 {
            world.step().unwrap();
        }
        assert_eq!(world.body_state(h).unwrap().pos, Vec2::new(100.0, 100.0));
        assert!(world.is_kinematic(h));

        world.set_kinematic(h, false).unwrap();
        world.set_collisions(h, true).unwrap();
        for _ in 0..10 {
            world.step().unwrap();
        }
        assert!(world.body_state(h).unwrap().pos.y > 100.0);
    }

    #[test]
    fn test_overlapping_bodies_report_one_pair() {
        let mut world = PhysicsWorld::new();
        world.init(&Tuning::default());
        let a = world.add_circle(circle(Vec2::new(100.0, 300.0), false)).unwrap();
        let b = world.add_circle(circle(Vec2::new(130.0, 300.0), false)).unwrap();
        let pairs = world.step().unwrap();
        let expected = BodyPair::new(a, b);
        assert_eq!(pairs.iter().filter(|p| **p == expected).count(), 1);
    }

    #[test]
    fn test_body_pair_is_order_independent() {
        let mut world = PhysicsWorld::new();
        world.init(&Tuning::default());
        let a = world.add_circle(circle(Vec2::new(50.0, 300.0), false)).unwrap();
        let b = world.add_circle(circle(Vec2::new(250.0, 300.0), false)).unwrap();
        assert_eq!(BodyPair::new(a, b), BodyPair::new(b, a));
        assert!(BodyPair::new(a, b).contains(b));
    }
}
