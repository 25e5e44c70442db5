use std::{collections::HashMap, str::FromStr};

use stager_model::Stack;

use crate::config::ConfigError;

/// Stack name to compiler archive path on the artifact server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerTable(HashMap<Stack, String>);

impl CompilerTable {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, stack: impl Into<Stack>, path: impl Into<String>) {
        self.0.insert(stack.into(), path.into());
    }

    pub fn get(&self, stack: &str) -> Option<&str> {
        self.0.get(stack).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S, P> FromIterator<(S, P)> for CompilerTable
where
    S: Into<Stack>,
    P: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, P)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(s, p)| (s.into(), p.into())).collect())
    }
}

/// Parses `stack=path[,stack=path...]`.
impl FromStr for CompilerTable {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = CompilerTable::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (stack, path) = entry
                .split_once('=')
                .map(|(s, p)| (s.trim(), p.trim()))
                .filter(|(s, p)| !s.is_empty() && !p.is_empty())
                .ok_or_else(|| ConfigError::InvalidCompiler(entry.to_string()))?;
            table.insert(stack, path);
        }
        Ok(table)
    }
}
