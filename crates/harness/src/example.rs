use std::fmt;

use anyhow::Result;

use crate::context::Context;

/// One self-contained GPU demonstration.
///
/// The runner calls `init` once, then `update` and `draw` every frame, and
/// `quit` when the example is left. `quit` is expected to release the
/// example's GPU objects and call [`Context::common_quit`].
pub trait Example {
    fn name(&self) -> &'static str;
    fn init(&mut self, context: &mut Context) -> Result<()>;
    fn update(&mut self, context: &mut Context) -> Result<()>;
    fn draw(&mut self, context: &mut Context) -> Result<()>;
    fn quit(&mut self, context: &mut Context);
}

/// Registry entry describing how to build an example.
#[derive(Clone, Copy)]
pub struct ExampleEntry {
    pub name: &'static str,
    pub summary: &'static str,
    pub build: fn() -> Box<dyn Example>,
}

impl fmt::Debug for ExampleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExampleEntry")
            .field("name", &self.name)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no examples registered")]
    Empty,
    #[error("example '{0}' is registered twice")]
    Duplicate(&'static str),
    #[error("unknown example '{name}' (available: {available})")]
    Unknown { name: String, available: String },
}

/// Ordered list of examples the runner can cycle through.
#[derive(Debug, Clone)]
pub struct ExampleRegistry {
    entries: Vec<ExampleEntry>,
}

impl ExampleRegistry {
    pub fn new(entries: impl IntoIterator<Item = ExampleEntry>) -> Result<Self, RegistryError> {
        let entries: Vec<ExampleEntry> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            if entries[..index]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(entry.name))
            {
                return Err(RegistryError::Duplicate(entry.name));
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ExampleEntry] {
        &self.entries
    }

    /// Entry at `index`, wrapping out-of-range indices.
    pub fn get(&self, index: usize) -> &ExampleEntry {
        &self.entries[index % self.entries.len()]
    }

    /// Finds an example by name, ignoring ASCII case.
    pub fn position(&self, name: &str) -> Result<usize, RegistryError> {
        self.entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.entries.len()
    }

    pub fn previous_index(&self, index: usize) -> usize {
        let len = self.entries.len();
        (index % len + len - 1) % len
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.name).collect()
    }
}
