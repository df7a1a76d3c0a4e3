//! Persistent plan accumulator
//!
//! Every appended stage produces a new `Plan` that links back to the one it
//! extends, so plans derived from a shared base share their common prefix.

use crate::Node;
use std::fmt;
use std::sync::Arc;

/// Ordered, append-only sequence of operator nodes. Stage 0 is the source.
#[derive(Clone)]
pub struct Plan {
    head: Arc<Stage>,
}

struct Stage {
    node: Node,
    prev: Option<Arc<Stage>>,
    source: Node,
    len: usize,
}

// Unlink the chain one stage at a time; the default drop recurses per stage.
impl Drop for Stage {
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(stage) = prev {
            match Arc::into_inner(stage) {
                Some(mut stage) => prev = stage.prev.take(),
                None => break,
            }
        }
    }
}

impl Plan {
    /// Start a plan from its source operator
    pub fn new(source: Node) -> Self {
        Self {
            head: Arc::new(Stage {
                node: source.clone(),
                prev: None,
                source,
                len: 1,
            }),
        }
    }

    /// Append one stage, leaving `self` untouched
    pub fn apply_stage(&self, node: Node) -> Self {
        Self {
            head: Arc::new(Stage {
                node,
                prev: Some(Arc::clone(&self.head)),
                source: self.head.source.clone(),
                len: self.head.len + 1,
            }),
        }
    }

    /// The stage-0 operator that established where rows originate
    pub fn source(&self) -> &Node {
        &self.head.source
    }

    /// The most recently appended stage
    pub fn last(&self) -> &Node {
        &self.head.node
    }

    pub fn len(&self) -> usize {
        self.head.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Stages in pipeline order (source first)
    pub fn stages(&self) -> Vec<&Node> {
        let mut stages = Vec::with_capacity(self.head.len);
        let mut cursor = Some(&self.head);
        while let Some(stage) = cursor {
            stages.push(&stage.node);
            cursor = stage.prev.as_ref();
        }
        stages.reverse();
        stages
    }

    /// True when `self` was derived from `base` by appending stages
    pub fn extends(&self, base: &Plan) -> bool {
        let mut cursor = Some(&self.head);
        while let Some(stage) = cursor {
            if Arc::ptr_eq(stage, &base.head) {
                return true;
            }
            cursor = stage.prev.as_ref();
        }
        false
    }
}

impl PartialEq for Plan {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.head, &other.head) || self.stages() == other.stages()
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stages()).finish()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages().into_iter().enumerate() {
            if i > 0 {
                write!(f, " |> ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}
