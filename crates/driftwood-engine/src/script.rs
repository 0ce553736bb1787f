//! Outbound script hooks.
//!
//! Maps and tiles name scripts as `module:function[:args]` strings. The
//! engine parses them into a [`ScriptCall`] and hands them to the host's
//! [`ScriptBridge`]; what a call does is entirely up to the host.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::EngineError;

// ---------------------------------------------------------------------------
// ScriptCall
// ---------------------------------------------------------------------------

/// A parsed script hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCall {
    pub module: String,
    pub function: String,
    /// Remaining `:`-separated fields, passed through verbatim.
    pub args: Vec<String>,
}

impl ScriptCall {
    /// Parse `module:function[:args...]`.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let mut parts = raw.split(':');
        let module = parts.next().unwrap_or_default().trim();
        let function = parts.next().map(str::trim).unwrap_or_default();
        if module.is_empty() || function.is_empty() {
            return Err(EngineError::MalformedScriptCall {
                raw: raw.to_owned(),
            });
        }
        Ok(Self {
            module: module.to_owned(),
            function: function.to_owned(),
            args: parts.map(str::to_owned).collect(),
        })
    }
}

impl fmt::Display for ScriptCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.function)?;
        for arg in &self.args {
            write!(f, ":{arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptBridge
// ---------------------------------------------------------------------------

/// Host side of script hooks.
pub trait ScriptBridge {
    fn call(&mut self, call: &ScriptCall);
}

/// Discards every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScripts;

impl ScriptBridge for NullScripts {
    fn call(&mut self, _call: &ScriptCall) {}
}

/// Records calls into a log shared with its clones, so a host (or a test)
/// can keep a handle after giving the bridge to the engine.
#[derive(Debug, Clone, Default)]
pub struct RecordingScripts {
    log: Rc<RefCell<Vec<ScriptCall>>>,
}

impl RecordingScripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ScriptCall> {
        self.log.borrow().clone()
    }

    /// Calls rendered back to `module:function[:args]` form.
    pub fn rendered(&self) -> Vec<String> {
        self.log.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl ScriptBridge for RecordingScripts {
    fn call(&mut self, call: &ScriptCall) {
        self.log.borrow_mut().push(call.clone());
    }
}

/// Parse `raw` and forward it. Malformed hooks are logged and skipped.
pub(crate) fn dispatch(scripts: &mut dyn ScriptBridge, hook: &'static str, raw: &str) {
    match ScriptCall::parse(raw) {
        Ok(call) => {
            debug!(hook, %call, "script call");
            scripts.call(&call);
        }
        Err(err) => warn!(hook, %err, "skipping script hook"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
