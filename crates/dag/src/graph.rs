// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step-graph validation and layering.

use drover_core::StepDefinition;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised while validating a step graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate step name '{0}'")]
    DuplicateStep(String),
    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },
    #[error("pipeline contains a cycle among steps: {0}")]
    Cycle(String),
}

/// Group steps into execution layers with Kahn's algorithm.
///
/// Every step lands in the earliest layer at which all of its
/// dependencies sit in strictly earlier layers, so members of one layer
/// are mutually independent. Layers keep the input step order. An empty
/// step list yields an empty layering.
pub fn layer_steps(steps: &[StepDefinition]) -> Result<Vec<Vec<String>>, GraphError> {
    let mut names = HashSet::with_capacity(steps.len());
    for step in steps {
        if !names.insert(step.name.as_str()) {
            return Err(GraphError::DuplicateStep(step.name.clone()));
        }
    }

    // adjacency[parent] = children that depend on parent
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::with_capacity(steps.len());
    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
    for step in steps {
        adjacency.entry(step.name.as_str()).or_default();
        in_degree.entry(step.name.as_str()).or_insert(0);
    }
    for step in steps {
        for dep in &step.depends_on {
            if !names.contains(dep.as_str()) {
                return Err(GraphError::UnknownDependency {
                    step: step.name.clone(),
                    dependency: dep.clone(),
                });
            }
            adjacency
                .entry(dep.as_str())
                .or_default()
                .push(step.name.as_str());
            if let Some(degree) = in_degree.get_mut(step.name.as_str()) {
                *degree += 1;
            }
        }
    }

    let position: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();

    // Seed the frontier with every zero-indegree node, in input order.
    let mut frontier: Vec<&str> = steps
        .iter()
        .map(|s| s.name.as_str())
        .filter(|name| in_degree.get(name).copied() == Some(0))
        .collect();

    let mut layers: Vec<Vec<String>> = Vec::new();
    let mut emitted = 0usize;

    while !frontier.is_empty() {
        let mut next: Vec<&str> = Vec::new();
        for name in &frontier {
            emitted += 1;
            for child in adjacency.get(name).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(child);
                    }
                }
            }
        }
        layers.push(frontier.iter().map(|s| s.to_string()).collect());
        next.sort_by_key(|name| position.get(name).copied().unwrap_or(usize::MAX));
        frontier = next;
    }

    if emitted != steps.len() {
        let mut stuck: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(name, _)| *name)
            .collect();
        stuck.sort_unstable();
        return Err(GraphError::Cycle(stuck.join(", ")));
    }

    Ok(layers)
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
