//! Position-based dynamics core for interactive soft-tissue simulation.
//!
//! Five components (spec §2-§4): a particle [`state`] store, a
//! [`constraints`] library, a [`model`] that owns constraints and runs the
//! predict/project/integrate cycle, a [`collision`] pipeline that turns
//! geometric overlap into contact constraints, and a [`step_controller`]
//! that ties the frame loop and device input together.

pub mod collision;
pub mod config;
pub mod constraints;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod model;
pub mod state;
pub mod step_controller;

pub use config::PbdConfig;
pub use error::{PhysicsError, Result};
pub use materials::MaterialType;
pub use model::PbdModel;
pub use state::StateStore;
pub use step_controller::{ColliderSpec, CollisionPair, DeviceInput, StepController, CUT_TRIGGER};
