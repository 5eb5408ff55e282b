//! Stream dependency graph
//!
//! Validates stream definitions at startup and answers parent/child and
//! selection queries.

use super::types::{StreamDefinition, StreamKind};
use crate::error::{Error, Result};
use crate::template::extract_placeholders;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Validated, acyclic parent→child graph of streams
#[derive(Debug, Clone)]
pub struct StreamGraph {
    /// Definitions in declaration order
    streams: Vec<StreamDefinition>,
    /// Name → index into `streams`
    index: HashMap<String, usize>,
    /// Parent name → child names, in declaration order
    children: HashMap<String, Vec<String>>,
}

impl StreamGraph {
    /// Validate definitions into a graph
    ///
    /// Rejects duplicate names, unknown parents, cycles, and path
    /// placeholders that neither the parent's projection nor a fan-out key
    /// can supply.
    pub fn new(streams: Vec<StreamDefinition>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, stream) in streams.iter().enumerate() {
            if index.insert(stream.name.clone(), i).is_some() {
                return Err(Error::graph(format!(
                    "duplicate stream name '{}'",
                    stream.name
                )));
            }
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for stream in &streams {
            if let Some(parent) = &stream.parent {
                if !index.contains_key(parent) {
                    return Err(Error::graph(format!(
                        "stream '{}' has unknown parent '{}'",
                        stream.name, parent
                    )));
                }
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(stream.name.clone());
            }
        }

        let graph = Self {
            streams,
            index,
            children,
        };
        graph.check_acyclic()?;
        graph.check_placeholders()?;
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<()> {
        for stream in &self.streams {
            let mut seen = HashSet::new();
            let mut current = Some(stream);
            while let Some(s) = current {
                if !seen.insert(s.name.as_str()) {
                    return Err(Error::graph(format!(
                        "cycle through stream '{}'",
                        stream.name
                    )));
                }
                current = s.parent.as_deref().and_then(|p| self.get(p));
            }
        }
        Ok(())
    }

    fn check_placeholders(&self) -> Result<()> {
        for stream in &self.streams {
            let mut available: HashSet<&str> = HashSet::new();
            if let Some(parent) = stream.parent.as_deref().and_then(|p| self.get(p)) {
                available.extend(parent.child_context.keys());
            }
            if let StreamKind::FanOut { key, .. } = &stream.kind {
                available.insert(key.as_str());
            }

            if let Some(missing) = extract_placeholders(&stream.path)
                .into_iter()
                .find(|p| !available.contains(p.as_str()))
            {
                return Err(Error::graph(format!(
                    "stream '{}' path '{}' uses placeholder '{{{}}}' that no context provides",
                    stream.name, stream.path, missing
                )));
            }
        }
        Ok(())
    }

    /// Look up a stream by name
    pub fn get(&self, name: &str) -> Option<&StreamDefinition> {
        self.index.get(name).map(|&i| &self.streams[i])
    }

    /// Look up a stream by name, failing when unknown
    pub fn require(&self, name: &str) -> Result<&StreamDefinition> {
        self.get(name).ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
    }

    /// All streams in declaration order
    pub fn streams(&self) -> impl Iterator<Item = &StreamDefinition> {
        self.streams.iter()
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Streams without a parent
    pub fn roots(&self) -> impl Iterator<Item = &StreamDefinition> {
        self.streams.iter().filter(|s| s.parent.is_none())
    }

    /// Direct children of a stream
    pub fn children(&self, name: &str) -> impl Iterator<Item = &StreamDefinition> {
        self.children
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|child| self.get(child))
    }

    /// Parent chain of a stream, nearest first
    pub fn ancestors(&self, name: &str) -> Vec<&StreamDefinition> {
        let mut chain = Vec::new();
        let mut current = self.get(name).and_then(|s| s.parent.as_deref());
        while let Some(parent) = current.and_then(|p| self.get(p)) {
            chain.push(parent);
            current = parent.parent.as_deref();
        }
        chain
    }

    /// Resolve a selection
    ///
    /// `None` selects every stream marked `selected_by_default`. Unknown
    /// names are an error.
    pub fn select(&self, names: Option<&[String]>) -> Result<Selection> {
        let selected: BTreeSet<String> = match names {
            Some(names) => {
                for name in names {
                    self.require(name)?;
                }
                names.iter().cloned().collect()
            }
            None => self
                .streams
                .iter()
                .filter(|s| s.selected_by_default)
                .map(|s| s.name.clone())
                .collect(),
        };

        let mut run = selected.clone();
        for name in &selected {
            run.extend(self.ancestors(name).into_iter().map(|s| s.name.clone()));
        }

        Ok(Selection { selected, run })
    }
}

/// Streams chosen for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Streams whose records and bookmarks are emitted
    selected: BTreeSet<String>,
    /// Selected streams plus every ancestor they need for contexts
    run: BTreeSet<String>,
}

impl Selection {
    /// Whether a stream's records are emitted
    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    /// Whether a stream must be fetched
    pub fn is_run(&self, name: &str) -> bool {
        self.run.contains(name)
    }

    /// Selected stream names
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}
