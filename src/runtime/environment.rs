use std::collections::HashMap;

use crate::error::{Error, Position, Result};
use crate::runtime::Value;

/// Environment for variable storage during execution
#[derive(Debug, Clone)]
pub struct Environment {
    /// Stack of frames; index 0 is the global frame
    frames: Vec<Frame>,
}

/// Single frame in the environment
#[derive(Debug, Clone)]
struct Frame {
    /// Variables bound in this frame
    variables: HashMap<String, Value>,
    /// Index of the enclosing frame (None for the global frame)
    parent: Option<usize>,
}

impl Environment {
    /// Creates a new environment holding only the global frame
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame {
                variables: HashMap::new(),
                parent: None,
            }],
        }
    }

    /// Pushes a new innermost frame
    pub fn enter_scope(&mut self) {
        let parent_idx = self.frames.len() - 1;
        self.frames.push(Frame {
            variables: HashMap::new(),
            parent: Some(parent_idx),
        });
    }

    /// Pops the innermost frame; the global frame is never popped
    pub fn exit_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Binds a variable in the innermost frame
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.innermost_mut().variables.insert(name.into(), value);
    }

    /// Check whether the innermost frame binds `name`
    pub fn contains_current(&self, name: &str) -> bool {
        self.innermost().variables.contains_key(name)
    }

    /// Reads a variable, searching frames innermost to outermost
    pub fn get(&self, name: &str, position: Option<Position>) -> Result<&Value> {
        self.find(name).map(|idx| &self.frames[idx].variables[name]).ok_or_else(|| {
            Error::runtime(format!("Variable {} not found", name), position)
        })
    }

    /// Overwrites the innermost existing binding of `name`
    pub fn set(&mut self, name: &str, value: Value, position: Option<Position>) -> Result<()> {
        *self.slot_mut(name, position)? = value;
        Ok(())
    }

    /// Mutable access to the innermost existing binding of `name`
    pub fn slot_mut(&mut self, name: &str, position: Option<Position>) -> Result<&mut Value> {
        let idx = self.find(name).ok_or_else(|| {
            Error::runtime(format!("Variable {} not declared", name), position)
        })?;
        self.frames[idx]
            .variables
            .get_mut(name)
            .ok_or_else(|| Error::runtime(format!("Variable {} not declared", name), position))
    }

    /// Returns a copy of every variable in the global frame
    pub fn snapshot_global(&self) -> HashMap<String, Value> {
        self.frames[0].variables.clone()
    }

    /// Returns the current frame depth (1 for global only)
    pub fn scope_depth(&self) -> usize {
        self.frames.len()
    }

    /// Index of the innermost frame binding `name`, walking the parent chain
    fn find(&self, name: &str) -> Option<usize> {
        let mut idx = self.frames.len() - 1;
        loop {
            let frame = &self.frames[idx];
            if frame.variables.contains_key(name) {
                return Some(idx);
            }
            idx = frame.parent?;
        }
    }

    fn innermost(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn innermost_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
