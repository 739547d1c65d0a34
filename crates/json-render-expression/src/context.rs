use serde_json::Value;

/// The per-item scope active while a `repeat` element expands its children.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatScope<'a> {
    /// The current item of the repeated state array.
    pub item: &'a Value,
    /// Position of `item` in the array.
    pub index: usize,
    /// Absolute state pointer of `item`, e.g. `/todos/3`.
    pub base_path: String,
}

/// Everything an expression may read while being resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionContext<'a> {
    pub state: &'a Value,
    pub repeat: Option<RepeatScope<'a>>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(state: &'a Value) -> Self {
        ResolutionContext { state, repeat: None }
    }

    pub fn with_repeat(mut self, item: &'a Value, index: usize, base_path: impl Into<String>) -> Self {
        self.repeat = Some(RepeatScope {
            item,
            index,
            base_path: base_path.into(),
        });
        self
    }

    pub fn repeat_item(&self) -> Option<&'a Value> {
        self.repeat.as_ref().map(|scope| scope.item)
    }

    pub fn repeat_index(&self) -> Option<usize> {
        self.repeat.as_ref().map(|scope| scope.index)
    }
}
