//! Component D: Collision Pipeline (spec §3, §4.D).
//!
//! Broad phase is AABB pruning per pair (mesh-mesh) or a direct analytic
//! test (plane/sphere pairs need no broad phase); narrow phase is one
//! function per geometry-pair kind, each grounded on the matching
//! `imstk*CD.cpp` file under
//! `examples/original_source/Base/Collision/CollisionDetection/`.
//! Collision pairs are canonicalized by [`ColliderKind`] rank so a pair
//! is only ever dispatched in one direction (spec §4.D: "canonicalize
//! A ≤ B by kind order").

pub mod mesh_mesh;
pub mod mesh_plane;
pub mod mesh_sphere;
pub mod plane_sphere;
pub mod sphere_sphere;

pub mod cut;

use glam::Vec3;

use crate::mesh::{Mesh, Topology, Tri};
use crate::state::StateStore;

/// Point-direction contact: a single contact point, separation direction,
/// and penetration depth. Mirrors `PDColData` (spec §4.D), produced by
/// analytic-vs-analytic pairs (sphere-sphere; plane-sphere by extension).
#[derive(Clone, Copy, Debug)]
pub struct PdRecord {
    pub point: Vec3,
    pub direction: Vec3,
    pub depth: f32,
}

/// Mesh-to-analytic contact: one simulated vertex and the correction
/// vector that would resolve its penetration against a static surface.
/// Mirrors `MAColData`.
#[derive(Clone, Copy, Debug)]
pub struct MaRecord {
    pub vertex: u32,
    pub correction: Vec3,
}

/// Triangle-vertex contact (mesh A's face against mesh B's vertex).
/// Mirrors `TVColData`.
#[derive(Clone, Copy, Debug)]
pub struct TvRecord {
    pub tri: [u32; 3],
    pub tri_bary: [f32; 3],
    pub vertex: u32,
}

/// Vertex-triangle contact (mesh A's vertex against mesh B's face).
/// Mirrors `VTColData`.
#[derive(Clone, Copy, Debug)]
pub struct VtRecord {
    pub vertex: u32,
    pub tri: [u32; 3],
    pub tri_bary: [f32; 3],
}

/// Edge-edge contact between two mesh edges, with each edge's closest
/// point expressed as an interpolation parameter `t ∈ [0,1]`. Mirrors
/// `EEColData`.
#[derive(Clone, Copy, Debug)]
pub struct EeRecord {
    pub edge_a: [u32; 2],
    pub t_a: f32,
    pub edge_b: [u32; 2],
    pub t_b: f32,
}

/// All contacts detected during one narrow-phase pass (spec §4.D). A
/// single geometry pair populates at most one of the five lists.
#[derive(Default, Clone, Debug)]
pub struct CollisionData {
    pub pd: Vec<PdRecord>,
    pub ma: Vec<MaRecord>,
    pub tv: Vec<TvRecord>,
    pub vt: Vec<VtRecord>,
    pub ee: Vec<EeRecord>,
}

impl CollisionData {
    pub fn is_empty(&self) -> bool {
        self.pd.is_empty() && self.ma.is_empty() && self.tv.is_empty() && self.vt.is_empty() && self.ee.is_empty()
    }

    pub fn clear(&mut self) {
        self.pd.clear();
        self.ma.clear();
        self.tv.clear();
        self.vt.clear();
        self.ee.clear();
    }
}

/// A static analytic plane, given by a point on the plane and its unit
/// normal. Owned by the collision pipeline (spec: rendering/scene-graph
/// placement of the plane is an external concern; only its pose matters
/// here).
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

/// A static or simulated analytic sphere. `center` is read fresh each
/// frame by the caller (e.g. from a particle position, for a simulated
/// sphere collider), so this struct never borrows [`StateStore`].
#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

/// A simulated triangle mesh collider: local vertex id `v` maps to
/// particle index `indices[v]` in the shared [`StateStore`].
pub struct MeshCollider<'a> {
    pub indices: &'a [u32],
    pub triangles: &'a [Tri],
}

impl<'a> MeshCollider<'a> {
    pub fn from_mesh(mesh: &'a dyn Mesh, indices: &'a [u32]) -> Self {
        Self {
            indices,
            triangles: mesh.topology().as_triangles().unwrap_or(&[]),
        }
    }

    /// As [`Self::from_mesh`], but reads triangles from a bare `Topology`
    /// rather than a `dyn Mesh` — used by the step controller, which holds
    /// a `PbdModel`'s captured topology directly (spec §4.E).
    pub fn from_topology(topology: &'a Topology, indices: &'a [u32]) -> Self {
        Self {
            indices,
            triangles: topology.as_triangles().unwrap_or(&[]),
        }
    }

    pub fn position(&self, state: &StateStore, local: u32) -> Vec3 {
        state.position[self.indices[local as usize] as usize]
    }

    /// Map a collider-local vertex id to its global particle index.
    pub fn global_index(&self, local: u32) -> u32 {
        self.indices[local as usize]
    }
}

/// Tags a collider's geometric kind, used only to canonicalize pair
/// ordering (spec §4.D). Rank order is arbitrary but fixed:
/// Plane < Sphere < Mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColliderKind {
    Plane,
    Sphere,
    Mesh,
}

pub enum CollisionShape<'a> {
    Plane(Plane),
    Sphere(Sphere),
    Mesh(MeshCollider<'a>),
}

impl<'a> CollisionShape<'a> {
    fn kind(&self) -> ColliderKind {
        match self {
            CollisionShape::Plane(_) => ColliderKind::Plane,
            CollisionShape::Sphere(_) => ColliderKind::Sphere,
            CollisionShape::Mesh(_) => ColliderKind::Mesh,
        }
    }
}

/// Narrow-phase dispatch over one candidate pair. Canonicalizes by
/// `ColliderKind` rank so `(mesh, plane)` and `(plane, mesh)` always
/// resolve to the same underlying call, with the correction/records
/// swapped to still refer to the original `a`/`b` order on return
/// where the handler's contract requires it (mesh-plane, mesh-sphere
/// always report against the mesh side and so need no swap-back;
/// sphere-sphere and mesh-mesh are reported per-side already).
pub fn detect(state: &StateStore, a: &CollisionShape, b: &CollisionShape, proximity: f32) -> CollisionData {
    if a.kind() > b.kind() {
        return detect(state, b, a, proximity);
    }
    match (a, b) {
        (CollisionShape::Plane(plane), CollisionShape::Sphere(sphere)) => {
            let mut data = CollisionData::default();
            if let Some(r) = plane_sphere::detect(plane, sphere) {
                data.pd.push(r);
            }
            data
        }
        (CollisionShape::Plane(plane), CollisionShape::Mesh(mesh)) => {
            let mut data = CollisionData::default();
            data.ma = mesh_plane::detect(state, mesh, plane);
            data
        }
        (CollisionShape::Sphere(sa), CollisionShape::Sphere(sb)) => sphere_sphere::detect(sa, sb),
        (CollisionShape::Sphere(sphere), CollisionShape::Mesh(mesh)) => {
            let mut data = CollisionData::default();
            data.ma = mesh_sphere::detect(state, mesh, sphere);
            data
        }
        (CollisionShape::Mesh(ma), CollisionShape::Mesh(mb)) => mesh_mesh::detect(state, ma, mb, proximity),
        _ => CollisionData::default(),
    }
}
