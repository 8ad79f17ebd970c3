// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! User exceptions. Sliced like classes, but always in the sliced format,
//! with string type ids and never referenced from elsewhere in the graph.

use super::member::sort_by_tag;
use super::DataMember;
use crate::error::{Error, Result};
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;

/// One level of an exception hierarchy.
#[derive(Debug)]
pub struct ExceptionDefinition {
    pub base: Option<Arc<ExceptionDescriptor>>,
    pub members: Vec<DataMember>,
    pub optional_members: Vec<DataMember>,
}

/// Exception type.
pub struct ExceptionDescriptor {
    id: String,
    definition: ArcSwapOption<ExceptionDefinition>,
}

impl fmt::Debug for ExceptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionDescriptor")
            .field("id", &self.id)
            .finish()
    }
}

impl ExceptionDescriptor {
    pub(crate) fn new(
        id: impl Into<String>,
        base: Option<Arc<ExceptionDescriptor>>,
        members: Vec<DataMember>,
    ) -> Result<Self> {
        let id = id.into();
        let (optional, required): (Vec<_>, Vec<_>) = members.into_iter().partition(|m| m.optional);
        let optional_members = sort_by_tag(&id, optional)?;
        let definition = ExceptionDefinition {
            base,
            members: required,
            optional_members,
        };
        Ok(Self {
            id,
            definition: ArcSwapOption::from_pointee(definition),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_defined(&self) -> bool {
        self.definition.load().is_some()
    }

    pub fn definition(&self) -> Result<Arc<ExceptionDefinition>> {
        self.definition.load_full().ok_or_else(|| {
            Error::configuration(format!("exception `{}` was destroyed", self.id))
        })
    }

    pub fn base(&self) -> Option<Arc<ExceptionDescriptor>> {
        self.definition.load().as_ref().and_then(|d| d.base.clone())
    }

    /// `true` if `self` is `type_id` or derives from it.
    pub fn is_a(&self, type_id: &str) -> bool {
        if self.id == type_id {
            return true;
        }
        let mut level = self.base();
        while let Some(ex) = level {
            if ex.id == type_id {
                return true;
            }
            level = ex.base();
        }
        false
    }

    /// Levels from `self` to the base.
    pub(crate) fn chain(
        self: &Arc<Self>,
    ) -> Result<Vec<(Arc<ExceptionDescriptor>, Arc<ExceptionDefinition>)>> {
        let mut levels = Vec::new();
        let mut level = Some(self.clone());
        while let Some(ex) = level {
            let def = ex.definition()?;
            level = def.base.clone();
            levels.push((ex, def));
        }
        Ok(levels)
    }

    pub fn destroy(&self) {
        self.definition.store(None);
    }
}
