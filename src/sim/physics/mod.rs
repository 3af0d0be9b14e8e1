//! Rigid-body world on top of rapier2d
//!
//! Zero gravity, no rotational dynamics. Fixed and kinematic bodies are
//! posed by the caller between steps; dynamic bodies are integrated by the
//! engine. Sensors never receive a response but still report collision
//! starts.
//!
//! Velocities cross this boundary in pixels per step and are converted to
//! the engine's pixels per second.

pub mod shape;

use std::collections::BTreeMap;

use glam::Vec2;
use rapier2d::parry::query::PointQuery;
use rapier2d::prelude::{
    ActiveEvents, CCDSolver, ChannelEventCollector, CoefficientCombineRule, Collider, ColliderBuilder,
    ColliderHandle, ColliderSet, CollisionEvent, ContactForceEvent, DefaultBroadPhase, Group,
    ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager, LockedAxes,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point, Real, RigidBody, RigidBodyBuilder,
    RigidBodyHandle, RigidBodySet, RigidBodyType, Rotation, Vector,
};
use serde::{Deserialize, Serialize};

pub use shape::{Aabb, Shape};

use crate::consts::TICK_MS;

/// Default body density (mass per square pixel)
pub const DEFAULT_DENSITY: f32 = 0.001;

/// Pixels per engine length unit, used to scale solver tolerances
const PIXELS_PER_UNIT: Real = 100.0;

/// Seconds per step
fn dt() -> Real {
    (TICK_MS / 1000.0) as Real
}

/// Stable body identifier; never reused within one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// How the engine moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    /// Posed by the caller every step
    Kinematic,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
        }
    }
}

/// Contact response layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    #[default]
    Default,
    Player,
    /// Overlaps players without pushing them; still solid to everything else
    Engulfing,
}

impl Layer {
    fn solver_groups(self) -> InteractionGroups {
        match self {
            Layer::Default => InteractionGroups::all(),
            Layer::Player => InteractionGroups::new(Group::GROUP_1, Group::ALL),
            Layer::Engulfing => InteractionGroups::new(Group::GROUP_2, Group::ALL.difference(Group::GROUP_1)),
        }
    }
}

/// Description of a body to insert
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub body_type: BodyType,
    pub is_sensor: bool,
    pub layer: Layer,
    pub ccd: bool,
    pub friction: f32,
    pub friction_air: f32,
    pub restitution: f32,
    pub density: f32,
}

impl BodyDesc {
    pub fn new(shape: Shape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            body_type: BodyType::Dynamic,
            is_sensor: false,
            layer: Layer::Default,
            ccd: false,
            friction: 0.1,
            friction_air: 0.01,
            restitution: 0.0,
            density: DEFAULT_DENSITY,
        }
    }

    pub fn circle(position: Vec2, radius: f32) -> Self {
        Self::new(Shape::circle(radius), position)
    }

    pub fn rect(position: Vec2, width: f32, height: f32) -> Self {
        Self::new(Shape::rect(width, height), position)
    }

    pub fn fixed(mut self) -> Self {
        self.body_type = BodyType::Fixed;
        self
    }

    pub fn kinematic(mut self) -> Self {
        self.body_type = BodyType::Kinematic;
        self
    }

    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Continuous collision detection, for fast small bodies
    pub fn ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn friction_air(mut self, friction_air: f32) -> Self {
        self.friction_air = friction_air;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }
}

/// Snapshot of a live body
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub handle: BodyHandle,
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    /// Pixels per step
    pub velocity: Vec2,
    pub is_static: bool,
    pub is_sensor: bool,
    pub friction: f32,
    pub friction_air: f32,
    pub restitution: f32,
    bounds: Aabb,
}

impl Body {
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Start of contact between two bodies (reported once per contact)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionStart {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Relative speed of the pair after the step, pixels per step
    pub speed: f32,
}

impl CollisionStart {
    /// The other body of the pair, if `handle` is part of it
    pub fn other(&self, handle: BodyHandle) -> Option<BodyHandle> {
        if self.a == handle {
            Some(self.b)
        } else if self.b == handle {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Engine handles behind one `BodyHandle`
#[derive(Debug, Clone, Copy)]
struct Slot {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    friction_air: f32,
}

/// The rigid-body world
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Ordered by handle (insertion order)
    slots: BTreeMap<BodyHandle, Slot>,
    next_handle: u32,
    /// Simulated time in ms
    timestamp: f64,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.slots.len())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt();
        integration_parameters.length_unit = PIXELS_PER_UNIT;
        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            slots: BTreeMap::new(),
            next_handle: 0,
            timestamp: 0.0,
        }
    }

    pub fn insert(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(to_na(desc.position))
            .rotation(desc.angle)
            .linvel(to_na(desc.velocity / dt()))
            .locked_axes(LockedAxes::ROTATION_LOCKED)
            .linear_damping(air_to_damping(desc.friction_air))
            .ccd_enabled(desc.ccd)
            .can_sleep(false)
            .user_data(u128::from(handle.0))
            .build();
        let body = self.rigid_bodies.insert(rb);

        let collider = ColliderBuilder::new(desc.shape.to_shared())
            .sensor(desc.is_sensor)
            .friction(desc.friction)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .restitution(desc.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .density(desc.density)
            .solver_groups(desc.layer.solver_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(u128::from(handle.0))
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.rigid_bodies);

        self.slots.insert(
            handle,
            Slot {
                body,
                collider,
                friction_air: desc.friction_air,
            },
        );
        handle
    }

    /// Remove a body. Returns false if it was already gone.
    pub fn remove(&mut self, handle: BodyHandle) -> bool {
        let Some(slot) = self.slots.remove(&handle) else {
            return false;
        };
        self.rigid_bodies.remove(
            slot.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }

    /// Remove every body. Handles keep counting so old ones stay invalid.
    pub fn clear(&mut self) {
        let handles: Vec<_> = self.slots.keys().copied().collect();
        for handle in handles {
            self.remove(handle);
        }
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<Body> {
        let slot = self.slots.get(&handle)?;
        let (rb, collider) = self.parts(slot)?;
        let position = rb.position();
        let aabb = collider.shape().compute_aabb(position);
        Some(Body {
            handle,
            shape: Shape::from_shared(collider.shared_shape()),
            position: from_na(position.translation.vector),
            angle: position.rotation.angle(),
            velocity: from_na(*rb.linvel()) * dt(),
            is_static: !rb.is_dynamic(),
            is_sensor: collider.is_sensor(),
            friction: collider.friction(),
            friction_air: slot.friction_air,
            restitution: collider.restitution(),
            bounds: Aabb::new(
                Vec2::new(aabb.mins.x, aabb.mins.y),
                Vec2::new(aabb.maxs.x, aabb.maxs.y),
            ),
        })
    }

    /// Every live body, in handle order
    pub fn bodies(&self) -> impl Iterator<Item = Body> + '_ {
        self.slots.keys().filter_map(|h| self.body(*h))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn parts(&self, slot: &Slot) -> Option<(&RigidBody, &Collider)> {
        Some((self.rigid_bodies.get(slot.body)?, self.colliders.get(slot.collider)?))
    }

    fn rigid_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let slot = self.slots.get(&handle)?;
        self.rigid_bodies.get_mut(slot.body)
    }

    fn collider_mut(&mut self, handle: BodyHandle) -> Option<&mut Collider> {
        let slot = self.slots.get(&handle)?;
        self.colliders.get_mut(slot.collider)
    }

    /// Teleport; takes effect immediately
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) -> bool {
        self.rigid_body_mut(handle)
            .map(|rb| rb.set_translation(to_na(position), true))
            .is_some()
    }

    /// `velocity` in pixels per step
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> bool {
        self.rigid_body_mut(handle)
            .map(|rb| rb.set_linvel(to_na(velocity / dt()), true))
            .is_some()
    }

    pub fn set_angle(&mut self, handle: BodyHandle, angle: f32) -> bool {
        self.rigid_body_mut(handle)
            .map(|rb| rb.set_rotation(Rotation::<Real>::new(angle), true))
            .is_some()
    }

    pub fn set_sensor(&mut self, handle: BodyHandle, is_sensor: bool) -> bool {
        self.collider_mut(handle).map(|c| c.set_sensor(is_sensor)).is_some()
    }

    /// Scale relative to the current size (cumulative), in body-local axes
    pub fn scale(&mut self, handle: BodyHandle, sx: f32, sy: f32) -> bool {
        let Some(collider) = self.collider_mut(handle) else {
            return false;
        };
        let mut shape = Shape::from_shared(collider.shared_shape());
        shape.scale(sx, sy);
        collider.set_shape(shape.to_shared());
        true
    }

    pub fn bounds(&self, handle: BodyHandle) -> Option<Aabb> {
        self.body(handle).map(|b| b.bounds())
    }

    pub fn contains_point(&self, handle: BodyHandle, point: Vec2) -> bool {
        self.slots
            .get(&handle)
            .and_then(|slot| self.parts(slot))
            .is_some_and(|(rb, collider)| {
                collider
                    .shape()
                    .contains_point(rb.position(), &Point::new(point.x, point.y))
            })
    }

    /// Simulated time in ms
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Advance one step and report pairs that started touching during it,
    /// ordered by handle pair.
    pub fn step(&mut self) -> Vec<CollisionStart> {
        self.timestamp += TICK_MS;

        let (collision_send, collision_recv) = rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) = rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &Vector::zeros(),
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut started = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            let CollisionEvent::Started(c1, c2, _) = event else {
                continue;
            };
            let (Some(a), Some(b)) = (self.owner(c1), self.owner(c2)) else {
                continue;
            };
            let (a, b) = (a.min(b), a.max(b));
            let speed = match (self.body(a), self.body(b)) {
                (Some(a), Some(b)) => (b.velocity - a.velocity).length(),
                _ => 0.0,
            };
            started.push(CollisionStart { a, b, speed });
        }
        started.sort_by_key(|s| (s.a, s.b));
        started.dedup_by_key(|s| (s.a, s.b));
        started
    }

    fn owner(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        let handle = BodyHandle(u32::try_from(self.colliders.get(collider)?.user_data).ok()?);
        self.contains(handle).then_some(handle)
    }
}

fn to_na(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

fn from_na(v: Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Per-step velocity loss `friction_air` expressed as engine damping
fn air_to_damping(friction_air: f32) -> Real {
    let keep = (1.0 - friction_air).clamp(0.01, 1.0);
    (1.0 - keep) / (keep * dt())
}
