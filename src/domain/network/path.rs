use crate::domain::utils::id::{LinkId, NodeId};

/// The set of links a flow traverses from `src` to `dst`.
///
/// The links are not necessarily stored in traversal order: delay aggregation only
/// depends on which links are on the path. Shortest-path routing stores them in reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub src: NodeId,
    pub dst: NodeId,
    links: Vec<LinkId>,
}

impl Path {
    pub fn new(src: impl Into<NodeId>, dst: impl Into<NodeId>) -> Self {
        Self { src: src.into(), dst: dst.into(), links: Vec::new() }
    }

    /// Adds a link unless it is already part of the path.
    pub fn add_link(&mut self, link: LinkId) {
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn contains(&self, link: LinkId) -> bool {
        self.links.contains(&link)
    }

    pub fn hop_count(&self) -> usize {
        self.links.len()
    }
}
