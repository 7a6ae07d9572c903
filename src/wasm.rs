//! Browser bindings. Thin wrappers that look a session up by handle and
//! forward to [`RigSession`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use glam::{Quat, Vec3};
use wasm_bindgen::prelude::*;

use crate::config::SolverConfig;
use crate::session::{ResolveReport, RigSession};

pub type RigHandle = u32;

// Session registry, only touched from the bindings below
thread_local! {
    static SESSIONS: RefCell<HashMap<RigHandle, RigSession>> = RefCell::new(HashMap::new());
    static NEXT_HANDLE: Cell<RigHandle> = const { Cell::new(1) };
}

/// Run a closure against a session with read-only access
///
/// Returns None if the handle is unknown
fn with_session<F, R>(handle: RigHandle, f: F) -> Option<R>
where
    F: FnOnce(&RigSession) -> R,
{
    SESSIONS.with(|sessions| sessions.borrow().get(&handle).map(f))
}

/// Run a closure against a session with mutable access
fn with_session_mut<F, R>(handle: RigHandle, f: F) -> Option<R>
where
    F: FnOnce(&mut RigSession) -> R,
{
    SESSIONS.with(|sessions| sessions.borrow_mut().get_mut(&handle).map(f))
}

/// Load a rig from JSON and return a handle to it
#[wasm_bindgen]
pub fn create_rig_session(rig_json: &str) -> Result<RigHandle, JsValue> {
    crate::init_logging();

    let session = RigSession::from_json(rig_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let handle = NEXT_HANDLE.with(|next| {
        let handle = next.get();
        next.set(handle.wrapping_add(1).max(1));
        handle
    });
    log::info!(
        "Created rig session {} ({} bones)",
        handle,
        session.skeleton.len()
    );
    SESSIONS.with(|sessions| sessions.borrow_mut().insert(handle, session));
    Ok(handle)
}

#[wasm_bindgen]
pub fn destroy_rig_session(handle: RigHandle) -> bool {
    SESSIONS.with(|sessions| sessions.borrow_mut().remove(&handle).is_some())
}

/// Attach a chain of `chain_length` bones ending at `effector_name`
#[wasm_bindgen]
pub fn attach_chain(
    handle: RigHandle,
    effector_name: &str,
    chain_length: usize,
    iteration_limit: u32,
    constrained: bool,
) -> bool {
    let config = SolverConfig::new(iteration_limit, chain_length);
    with_session_mut(handle, |session| {
        match session.attach_chain(effector_name, config, constrained) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not attach chain to '{}': {}", effector_name, e);
                false
            }
        }
    })
    .unwrap_or(false)
}

/// Set a world-space target position; the target keeps an identity rotation
#[wasm_bindgen]
pub fn set_chain_target(handle: RigHandle, x: f32, y: f32, z: f32) -> bool {
    with_session_mut(handle, |session| {
        session
            .set_target(Vec3::new(x, y, z), Quat::IDENTITY)
            .map_err(|e| log::warn!("set_chain_target: {}", e))
            .is_ok()
    })
    .unwrap_or(false)
}

/// Resolve the attached chain; returns `{ outcome, iterations }` or null
#[wasm_bindgen]
pub fn resolve_chain(handle: RigHandle) -> JsValue {
    let report = with_session_mut(handle, |session| match session.resolve() {
        Ok(relaxation) => Some(ResolveReport::from(relaxation)),
        Err(e) => {
            log::warn!("resolve_chain: {}", e);
            None
        }
    })
    .flatten();

    match report {
        Some(report) => serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL),
        None => JsValue::NULL,
    }
}

/// World positions of every bone as a flat [x, y, z, ...] array
#[wasm_bindgen]
pub fn get_bone_positions(handle: RigHandle) -> Vec<f32> {
    with_session(handle, RigSession::bone_positions).unwrap_or_default()
}

#[wasm_bindgen]
pub fn export_rig_json(handle: RigHandle) -> String {
    with_session(handle, |session| {
        session.to_json().unwrap_or_else(|e| {
            log::error!("Failed to export rig: {}", e);
            String::from("{}")
        })
    })
    .unwrap_or_else(|| String::from("{}"))
}
