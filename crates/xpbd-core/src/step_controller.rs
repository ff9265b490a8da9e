//! Component E: Coupling / Step Controller (spec §4.E, §5, §6).
//!
//! Runs the six-step per-frame sequence: pull external forces, predict,
//! run collision against every registered pair (translating records into
//! scratch contact constraints), project (persistent ∪ scratch), integrate
//! velocity, discard the scratch state. Cutting, if requested, runs between
//! steps 1 and 2. Owns the scratch constraint list and collision-data
//! buffer for the duration of a step (spec §5: "the step controller
//! exclusively owns the scratch constraint list for the duration of a
//! step"); both are pre-sized/grow-only rather than reallocated per step.

use glam::{Quat, Vec3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{instrument, warn};

use crate::collision::cut::cut_mesh;
use crate::collision::{self, CollisionData, MeshCollider, Plane, Sphere};
use crate::constraints::contact::{ContactConstraint, ContactPoint};
use crate::constraints::PbdConstraint;
use crate::error::Result;
use crate::mesh::InMemoryMesh;
use crate::model::PbdModel;

/// Bit in [`DeviceInput::buttons`] that requests a cut this frame, run
/// between steps 1 and 2 (spec §4.E, §4.F: device buttons map to
/// "grasp/cut triggers").
pub const CUT_TRIGGER: u32 = 1 << 0;

/// Per-step device-input snapshot (spec §6): position, orientation, linear
/// and angular velocity, a button bitset, and a desired force. Applied once
/// at step start (spec §5: "atomic snapshot of external forces/impulses,
/// applied once at step start").
#[derive(Clone, Copy, Debug)]
pub struct DeviceInput {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub buttons: u32,
    pub desired_force: Vec3,
}

impl Default for DeviceInput {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            buttons: 0,
            desired_force: Vec3::ZERO,
        }
    }
}

/// Identifies a collider participating in a registered pair without
/// borrowing the model (spec §4.D's geometry-kind enumeration, narrowed to
/// the handler contracts spec.md §4.D actually defines: plane, sphere,
/// mesh).
#[derive(Clone, Debug)]
pub enum ColliderSpec {
    /// A static analytic plane.
    Plane(Plane),
    /// A static analytic sphere (center fixed in world space).
    StaticSphere(Sphere),
    /// An analytic sphere whose center tracks a simulated particle each
    /// step (spec's *tet bounce* scenario: "wrapping each vertex in a tiny
    /// sphere").
    ParticleSphere { particle: u32, radius: f32 },
    /// A simulated triangle-mesh collider: `indices[local] = global
    /// particle index`, addressing the owning `StepController`'s model
    /// state (spec §4.D mesh-mesh / mesh-plane / mesh-sphere).
    Mesh { indices: Vec<u32> },
}

/// One registered collision pair (spec §4.E: "for every registered
/// collision pair").
pub struct CollisionPair {
    pub a: ColliderSpec,
    pub b: ColliderSpec,
}

/// Per-frame integration step controller (spec §4.E). Owns one `PbdModel`
/// plus the registered collision pairs and device-control bindings that
/// feed it.
pub struct StepController {
    pub model: PbdModel,
    pub pairs: Vec<CollisionPair>,
    /// Particles whose pose is driven directly by `DeviceInput` (pinned,
    /// grasped tool tip); spec §6: "pinned-particle pose updates".
    pub device_pinned_particles: Vec<u32>,
    /// Particles that receive `DeviceInput::desired_force` as an external
    /// acceleration contribution each step; spec §6: "applied external
    /// force on a designated particle subset".
    pub device_force_particles: Vec<u32>,
    /// The cuttable mesh mirror, kept in lockstep with `model.state` (spec
    /// §4.D: the cut operator grows both the mesh's vertex list and the
    /// particle store together). `None` for bodies that never cut.
    pub cuttable_mesh: Option<InMemoryMesh>,
    /// Where the next triggered cut slices the mesh. Set once per frame (or
    /// left as the tool's last pose) before `CUT_TRIGGER` fires; `None`
    /// makes a cut trigger a no-op.
    pub cut_plane: Option<Plane>,
    scratch: Vec<PbdConstraint>,
    collision_data: CollisionData,
    pending_device_input: Option<DeviceInput>,
}

impl StepController {
    pub fn new(model: PbdModel) -> Self {
        Self {
            model,
            pairs: Vec::new(),
            device_pinned_particles: Vec::new(),
            device_force_particles: Vec::new(),
            cuttable_mesh: None,
            cut_plane: None,
            scratch: Vec::new(),
            collision_data: CollisionData::default(),
            pending_device_input: None,
        }
    }

    /// Latch this frame's device-input snapshot; consumed (and cleared) by
    /// the next `step()` call (spec §6).
    pub fn set_device_input(&mut self, input: DeviceInput) {
        self.pending_device_input = Some(input);
    }

    /// Applies the pending device-input snapshot, if any, and reports
    /// whether a cut was requested this frame (spec §6: "applied once at
    /// step start"). `device_force_particles`' acceleration is zeroed
    /// first regardless of whether a new snapshot arrived, so a one-frame
    /// impulse does not persist into steps where no `DeviceInput` is set —
    /// `predict()` would otherwise re-add a stale force forever.
    fn apply_device_input(&mut self) -> bool {
        for &p in &self.device_force_particles {
            let idx = p as usize;
            if idx < self.model.state.count() {
                self.model.state.acceleration[idx] = Vec3::ZERO;
            }
        }

        let Some(input) = self.pending_device_input.take() else {
            return false;
        };
        for &p in &self.device_pinned_particles {
            let idx = p as usize;
            if idx < self.model.state.count() {
                self.model.state.position[idx] = input.position;
            }
        }
        for &p in &self.device_force_particles {
            let idx = p as usize;
            if idx < self.model.state.count() {
                self.model.state.acceleration[idx] = input.desired_force;
            }
        }
        input.buttons & CUT_TRIGGER != 0
    }

    /// Runs the cutting operator against `cuttable_mesh` at `cut_plane`,
    /// then patches the model's persistent constraint list from the
    /// resulting `CutReport` (spec §4.D final paragraph). A no-op if either
    /// is unconfigured — most registered bodies are never cut.
    fn run_cut(&mut self) -> Result<()> {
        let Some(plane) = self.cut_plane else {
            return Ok(());
        };
        let Some(mesh) = self.cuttable_mesh.as_mut() else {
            return Ok(());
        };
        let epsilon = self.model.config.cut_epsilon;
        let distance_stiffness = self.model.config.cut_distance_stiffness;
        let dihedral_stiffness = self.model.config.cut_dihedral_stiffness;
        let report = cut_mesh(mesh, &mut self.model.state, plane, epsilon)?;
        self.model.apply_cut(mesh, &report, distance_stiffness, dihedral_stiffness)?;
        Ok(())
    }

    /// Translate one pair's `CollisionData` into scratch contact
    /// constraints (spec §4.E): "MA records are one-sided distance-to-point
    /// corrections; PD records become vertex-plane constraints; TV/VT/EE
    /// records become triangle-point or edge-edge friction-free contact
    /// constraints using the contact stiffness configured on the model."
    fn translate_contacts(&mut self, a: &ColliderSpec, b: &ColliderSpec) {
        let stiffness = self.model.config.contact_stiffness;
        let iters = self.model.config.iterations;
        let state = &self.model.state;

        // `sphere_sphere::detect` reports the same contact twice (once per
        // side's perspective, with opposing directions); `plane_sphere::detect`
        // reports it once. Translating every record would double-apply a
        // sphere-sphere contact with a second, wrongly-signed correction, so
        // only the first (canonical) record becomes a constraint.
        if let Some(pd) = self.collision_data.pd.first() {
            if let (Some(point_a), Some(point_b)) = (pd_contact_point(a), pd_contact_point(b)) {
                self.scratch.push(PbdConstraint::Contact(ContactConstraint::new(
                    point_a,
                    point_b,
                    pd.direction,
                    contact_rest_gap(a, b),
                    stiffness,
                    iters,
                )));
            }
        }

        for ma in &self.collision_data.ma {
            let mesh_spec = match (a, b) {
                (ColliderSpec::Mesh { indices }, _) => indices,
                (_, ColliderSpec::Mesh { indices }) => indices,
                _ => continue,
            };
            let global = mesh_spec[ma.vertex as usize];
            // `anchor` is already the fully-resolved surface point the
            // vertex should land on, so the constraint's rest gap is zero
            // (not `len` — `len` is the current penetration depth, which
            // the (pos - anchor)-dot-normal term already captures).
            let anchor = state.position[global as usize] + ma.correction;
            let len = ma.correction.length();
            if len < 1e-8 {
                continue;
            }
            let normal = ma.correction / len;
            self.scratch.push(PbdConstraint::Contact(ContactConstraint::new(
                ContactPoint::Particle(global),
                ContactPoint::Fixed(anchor),
                normal,
                0.0,
                stiffness,
                iters,
            )));
        }

        let mesh_indices_a = match a {
            ColliderSpec::Mesh { indices } => Some(indices),
            _ => None,
        };
        let mesh_indices_b = match b {
            ColliderSpec::Mesh { indices } => Some(indices),
            _ => None,
        };

        for vt in &self.collision_data.vt {
            let (Some(ia), Some(ib)) = (mesh_indices_a, mesh_indices_b) else { continue };
            let verts = [ib[vt.tri[0] as usize], ib[vt.tri[1] as usize], ib[vt.tri[2] as usize]];
            let vertex = ia[vt.vertex as usize];
            let normal = triangle_normal(state, verts);
            self.scratch.push(PbdConstraint::Contact(ContactConstraint::new(
                ContactPoint::Particle(vertex),
                ContactPoint::Triangle { verts, bary: vt.tri_bary },
                normal,
                0.0,
                stiffness,
                iters,
            )));
        }

        for tv in &self.collision_data.tv {
            let (Some(ia), Some(ib)) = (mesh_indices_a, mesh_indices_b) else { continue };
            let verts = [ia[tv.tri[0] as usize], ia[tv.tri[1] as usize], ia[tv.tri[2] as usize]];
            let vertex = ib[tv.vertex as usize];
            let normal = triangle_normal(state, verts);
            self.scratch.push(PbdConstraint::Contact(ContactConstraint::new(
                ContactPoint::Triangle { verts, bary: tv.tri_bary },
                ContactPoint::Particle(vertex),
                normal,
                0.0,
                stiffness,
                iters,
            )));
        }

        for ee in &self.collision_data.ee {
            let (Some(ia), Some(ib)) = (mesh_indices_a, mesh_indices_b) else { continue };
            let verts_a = [ia[ee.edge_a[0] as usize], ia[ee.edge_a[1] as usize]];
            let verts_b = [ib[ee.edge_b[0] as usize], ib[ee.edge_b[1] as usize]];
            let pa = state.position[verts_a[0] as usize].lerp(state.position[verts_a[1] as usize], ee.t_a);
            let pb = state.position[verts_b[0] as usize].lerp(state.position[verts_b[1] as usize], ee.t_b);
            let diff = pa - pb;
            let len = diff.length();
            if len < 1e-8 {
                continue;
            }
            self.scratch.push(PbdConstraint::Contact(ContactConstraint::new(
                ContactPoint::Edge { verts: verts_a, t: ee.t_a },
                ContactPoint::Edge { verts: verts_b, t: ee.t_b },
                diff / len,
                0.0,
                stiffness,
                iters,
            )));
        }
    }

    /// Run the full per-frame sequence (spec §4.E). Fails with
    /// `Unconfigured` if geometry has not been set.
    #[instrument(skip(self))]
    pub fn step(&mut self) -> Result<()> {
        self.model.topology()?;

        let cut_requested = self.apply_device_input();
        if cut_requested {
            self.run_cut()?;
        }
        self.model.predict();

        self.scratch.clear();

        // Narrow-phase detection reads only `self.model` and is independent
        // per pair, so it may run on a task pool (spec §5: "broad-phase BVH
        // refit and narrow-phase per-pair queries may run on a task pool").
        // Translation into scratch contact constraints stays sequential —
        // it mutates `self.scratch`, shared across pairs.
        let proximity = self.model.config.proximity;
        let detect_pair = |pair: &CollisionPair| -> CollisionData {
            let shape_a = build_shape(&self.model, &pair.a);
            let shape_b = build_shape(&self.model, &pair.b);
            collision::detect(&self.model.state, &shape_a, &shape_b, proximity)
        };
        #[cfg(feature = "parallel")]
        let pair_data: Vec<CollisionData> = self.pairs.par_iter().map(detect_pair).collect();
        #[cfg(not(feature = "parallel"))]
        let pair_data: Vec<CollisionData> = self.pairs.iter().map(detect_pair).collect();

        for (i, data) in pair_data.into_iter().enumerate() {
            self.collision_data = data;
            if self.collision_data.is_empty() {
                continue;
            }
            let (a, b) = {
                let pair = &self.pairs[i];
                (pair.a.clone(), pair.b.clone())
            };
            self.translate_contacts(&a, &b);
        }

        self.model.project_constraints(&mut self.scratch);
        self.model.integrate_velocity();

        self.scratch.clear();
        self.collision_data.clear();
        Ok(())
    }

    /// Renderer output (spec §6): the current vertex-position array,
    /// borrowed (no allocation, no copy).
    pub fn render_snapshot(&self) -> &[Vec3] {
        &self.model.state.position
    }

    /// Recomputed vertex normals, on request (spec §6).
    pub fn vertex_normals(&self) -> Result<Vec<Vec3>> {
        self.model.vertex_normals()
    }
}

/// Build a `CollisionShape` view for one collider spec. A free function
/// (rather than a `StepController` method) so its `'a` lifetime borrows
/// only `model`, not the whole controller — the caller still needs a
/// disjoint mutable borrow of `self.collision_data` in the same statement.
fn build_shape<'a>(model: &'a PbdModel, spec: &'a ColliderSpec) -> collision::CollisionShape<'a> {
    match spec {
        ColliderSpec::Plane(p) => collision::CollisionShape::Plane(*p),
        ColliderSpec::StaticSphere(s) => collision::CollisionShape::Sphere(*s),
        ColliderSpec::ParticleSphere { particle, radius } => {
            collision::CollisionShape::Sphere(Sphere {
                center: model.state.position[*particle as usize],
                radius: *radius,
            })
        }
        ColliderSpec::Mesh { indices } => {
            let topology = model.topology().expect("mesh collider requires set geometry");
            collision::CollisionShape::Mesh(MeshCollider::from_topology(topology, indices))
        }
    }
}

/// Maps one side of a PD (plane/sphere) collision pair to the
/// [`ContactPoint`] the contact constraint should act on: a simulated
/// particle for a `ParticleSphere`, or a fixed anchor (its center, or a
/// plane's point) for anything static. `None` for a `Mesh` side — mesh
/// colliders never produce PD records (spec §4.D: PD is plane/sphere only).
fn pd_contact_point(spec: &ColliderSpec) -> Option<ContactPoint> {
    match spec {
        ColliderSpec::Plane(plane) => Some(ContactPoint::Fixed(plane.point)),
        ColliderSpec::StaticSphere(s) => Some(ContactPoint::Fixed(s.center)),
        ColliderSpec::ParticleSphere { particle, .. } => Some(ContactPoint::Particle(*particle)),
        ColliderSpec::Mesh { .. } => None,
    }
}

fn contact_rest_gap(a: &ColliderSpec, b: &ColliderSpec) -> f32 {
    let radius = |spec: &ColliderSpec| match spec {
        ColliderSpec::StaticSphere(s) => s.radius,
        ColliderSpec::ParticleSphere { radius, .. } => *radius,
        _ => 0.0,
    };
    radius(a) + radius(b)
}

fn triangle_normal(state: &crate::state::StateStore, verts: [u32; 3]) -> Vec3 {
    let (p0, p1, p2) = (
        state.position[verts[0] as usize],
        state.position[verts[1] as usize],
        state.position[verts[2] as usize],
    );
    let n = (p1 - p0).cross(p2 - p0);
    let len = n.length();
    if len < 1e-8 {
        warn!("degenerate triangle normal in contact translation");
        Vec3::Y
    } else {
        n / len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PbdConfig;
    use crate::constraints::ConstraintKind;
    use crate::mesh::{InMemoryMesh, Topology};

    #[test]
    fn step_fails_unconfigured_before_set_geometry() {
        let model = PbdModel::new(PbdConfig::default());
        let mut controller = StepController::new(model);
        assert!(controller.step().is_err());
    }

    #[test]
    fn falling_particle_is_stopped_by_plane_contact() {
        let mesh = InMemoryMesh::new(vec![Vec3::new(0.0, 0.05, 0.0)], Topology::Edges(vec![]));
        let mut config = PbdConfig::default();
        config.dt = 0.01;
        config.iterations = 4;
        config.gravity = Vec3::new(0.0, -9.81, 0.0);
        let mut model = PbdModel::new(config);
        model.set_geometry(&mesh);

        let mut controller = StepController::new(model);
        controller.pairs.push(CollisionPair {
            a: ColliderSpec::ParticleSphere { particle: 0, radius: 0.05 },
            b: ColliderSpec::Plane(Plane { point: Vec3::ZERO, normal: Vec3::Y }),
        });

        for _ in 0..200 {
            controller.step().unwrap();
        }
        assert!(controller.render_snapshot()[0].y >= 0.05 - 1e-2);
    }

    #[test]
    fn moving_sphere_bounces_off_static_sphere() {
        // spec §8's sphere-sphere scenario: a static sphere at (-0.9,0,0)
        // and a simulated sphere at (0.9,0,0) moving toward it with
        // velocity (-1,0,0). A `StaticSphere` paired with a `ParticleSphere`
        // must actually resolve the penetration (not silently no-op, as it
        // would if this pair fell through to an unhandled catch-all).
        let mesh = InMemoryMesh::new(vec![Vec3::new(0.9, 0.0, 0.0)], Topology::Edges(vec![]));
        let mut config = PbdConfig::default();
        config.dt = 0.01;
        config.iterations = 4;
        config.gravity = Vec3::ZERO;
        let mut model = PbdModel::new(config);
        model.set_geometry(&mesh);
        model.state.velocity[0] = Vec3::new(-1.0, 0.0, 0.0);

        let mut controller = StepController::new(model);
        controller.pairs.push(CollisionPair {
            a: ColliderSpec::ParticleSphere { particle: 0, radius: 1.0 },
            b: ColliderSpec::StaticSphere(crate::collision::Sphere {
                center: Vec3::new(-0.9, 0.0, 0.0),
                radius: 1.0,
            }),
        });

        for _ in 0..10 {
            controller.step().unwrap();
        }

        let separation = controller.render_snapshot()[0].x - (-0.9);
        assert!(separation >= 2.0 - 1e-2, "spheres still overlap: separation = {separation}");
        assert!(
            controller.model.state.velocity[0].x >= 0.0,
            "moving sphere should be reflected away from the static sphere, got vx = {}",
            controller.model.state.velocity[0].x
        );
    }

    #[test]
    fn cut_trigger_runs_between_steps_and_patches_constraints() {
        // spec §8's "Cut" scenario, driven end-to-end through the frame
        // loop rather than by calling `cut_mesh`/`apply_cut` directly: a
        // flat quad is cut down the middle on a frame where the device
        // input's button bitset carries `CUT_TRIGGER`.
        let quad = InMemoryMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Topology::Triangles(vec![[0, 1, 2], [0, 2, 3]]),
        );
        let mut config = PbdConfig::default();
        config.gravity = Vec3::ZERO;
        let mut model = PbdModel::new(config);
        model.set_geometry(&quad);
        model.initialize_constraints(ConstraintKind::Distance, 0.9).unwrap();
        let constraints_before = model.constraints().len();

        let mut controller = StepController::new(model);
        controller.cuttable_mesh = Some(quad);
        controller.cut_plane = Some(Plane {
            point: Vec3::new(0.5, 0.0, 0.0),
            normal: Vec3::X,
        });
        controller.set_device_input(DeviceInput {
            buttons: CUT_TRIGGER,
            ..Default::default()
        });

        controller.step().unwrap();

        assert!(
            controller.model.state.count() > 4,
            "cut should have inserted cut-edge vertices"
        );
        assert_ne!(
            controller.model.constraints().len(),
            constraints_before,
            "cut should have patched the persistent constraint list"
        );
    }

    #[test]
    fn device_pinned_particle_tracks_input_position() {
        let mesh = InMemoryMesh::new(vec![Vec3::ZERO], Topology::Edges(vec![]));
        let mut model = PbdModel::new(PbdConfig::default());
        model.set_geometry(&mesh);
        model.state.pin(0).unwrap();

        let mut controller = StepController::new(model);
        controller.device_pinned_particles.push(0);
        controller.set_device_input(DeviceInput {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        });
        controller.step().unwrap();
        assert_eq!(controller.render_snapshot()[0], Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn device_force_does_not_persist_once_input_stops_arriving() {
        // spec §5: the force snapshot is "applied once at step start" — a
        // single `DeviceInput` impulse must not become a permanent
        // acceleration that `predict()` keeps re-adding every later step.
        let mesh = InMemoryMesh::new(vec![Vec3::ZERO], Topology::Edges(vec![]));
        let mut config = PbdConfig::default();
        config.gravity = Vec3::ZERO;
        config.dt = 0.1;
        let mut model = PbdModel::new(config);
        model.set_geometry(&mesh);

        let mut controller = StepController::new(model);
        controller.device_force_particles.push(0);
        controller.set_device_input(DeviceInput {
            desired_force: Vec3::new(10.0, 0.0, 0.0),
            ..Default::default()
        });

        controller.step().unwrap();
        let velocity_after_impulse_frame = controller.model.state.velocity[0];
        assert!(velocity_after_impulse_frame.x > 0.0);

        controller.step().unwrap();
        let velocity_after_second_frame = controller.model.state.velocity[0];
        assert!(
            (velocity_after_second_frame.x - velocity_after_impulse_frame.x).abs() < 1e-6,
            "a stale device force kept accelerating the particle on a frame with no new DeviceInput: {} -> {}",
            velocity_after_impulse_frame.x,
            velocity_after_second_frame.x
        );
    }
}
