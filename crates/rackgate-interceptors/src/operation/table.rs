use super::model::{ApiDocument, OperationDescriptor};
use crate::errors::InterceptError;
use rackgate_auth::model::ResourceGrant;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Clone, Debug)]
struct Route {
    segments: Vec<Segment>,
    descriptor: Arc<OperationDescriptor>,
}

/// Descriptor matched for a concrete request, with extracted path parameters.
#[derive(Clone, Debug)]
pub struct RouteMatch {
    pub descriptor: Arc<OperationDescriptor>,
    pub params: BTreeMap<String, String>,
}

/// Every operation of the API document, matched by method and path template.
#[derive(Clone, Debug, Default)]
pub struct OperationTable {
    base_path: String,
    routes: Vec<Route>,
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse_template(template: &str) -> Vec<Segment> {
    split(template)
        .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(seg.to_string()),
        })
        .collect()
}

impl OperationTable {
    pub fn from_document(doc: &ApiDocument) -> Result<Self, InterceptError> {
        let mut table = Self {
            base_path: doc.base_path.clone(),
            routes: Vec::new(),
        };
        for descriptor in doc.descriptors()? {
            table.insert(descriptor)?;
        }
        Ok(table)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, InterceptError> {
        Self::from_document(&ApiDocument::from_value(value)?)
    }

    pub fn insert(&mut self, descriptor: OperationDescriptor) -> Result<(), InterceptError> {
        let segments = parse_template(&descriptor.path);
        let duplicate = self
            .routes
            .iter()
            .any(|r| r.descriptor.method == descriptor.method && r.segments == segments);
        if duplicate {
            return Err(InterceptError::internal(&format!(
                "duplicate operation {} {}",
                descriptor.method, descriptor.path
            )));
        }
        self.routes.push(Route {
            segments,
            descriptor: Arc::new(descriptor),
        });
        Ok(())
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<OperationDescriptor>> {
        self.routes.iter().map(|r| &r.descriptor)
    }

    pub fn get(&self, operation_id: &str) -> Option<&Arc<OperationDescriptor>> {
        self.iter().find(|d| d.operation_id == operation_id)
    }

    /// Privilege declarations in the shape the policy store loads.
    pub fn grants(&self) -> Vec<ResourceGrant> {
        self.iter()
            .map(|d| ResourceGrant {
                path: d.path.clone(),
                method: d.method.clone(),
                roles: d.authorized_roles.clone(),
            })
            .collect()
    }

    /// Finds the operation for a concrete request path.
    ///
    /// When several templates match, literal segments win over parameters,
    /// compared left to right.
    pub fn resolve(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let parts: Vec<&str> = split(path).collect();
        let mut best: Option<(Vec<bool>, &Route)> = None;
        for route in &self.routes {
            if !route.descriptor.method.eq_ignore_ascii_case(method)
                || route.segments.len() != parts.len()
            {
                continue;
            }
            let matches = route.segments.iter().zip(&parts).all(|(seg, part)| match seg {
                Segment::Literal(lit) => lit == part,
                Segment::Param(_) => true,
            });
            if !matches {
                continue;
            }
            let rank: Vec<bool> = route
                .segments
                .iter()
                .map(|s| matches!(s, Segment::Literal(_)))
                .collect();
            if best.as_ref().map_or(true, |(current, _)| rank > *current) {
                best = Some((rank, route));
            }
        }

        best.map(|(_, route)| {
            let params = route
                .segments
                .iter()
                .zip(&parts)
                .filter_map(|(seg, part)| match seg {
                    Segment::Param(name) => Some((name.clone(), part.to_string())),
                    Segment::Literal(_) => None,
                })
                .collect();
            RouteMatch {
                descriptor: route.descriptor.clone(),
                params,
            }
        })
    }
}
