use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::network::{Network, link::Link, path::Path};
use crate::domain::utils::id::{LinkId, NodeId};
use crate::error::{Error, Result};

impl Network {
    /// Registers an explicitly routed path. The first path registered for a `(src, dst)` pair wins.
    pub fn add_path(&mut self, path: Path) {
        let key = (path.src.clone(), path.dst.clone());

        if self.path_cache.contains_key(&key) {
            log::debug!("Path {} -> {} already known, ignoring the new one.", key.0, key.1);
            return;
        }
        self.path_cache.insert(key, path);
    }

    /// Builds a path from a hop list of node ids, e.g. `["N0", "S0", "S1", "N1"]`.
    pub fn path_from_hops(&self, hops: &[NodeId]) -> Result<Path> {
        let (Some(src), Some(dst)) = (hops.first(), hops.last()) else {
            return Err(Error::ModelConstructionError("A path needs at least one hop.".to_string()));
        };

        let mut path = Path::new(src.clone(), dst.clone());
        for pair in hops.windows(2) {
            let link = self
                .get_link(&pair[0], &pair[1])
                .ok_or_else(|| Error::LinkNotFound { src: pair[0].clone(), dst: pair[1].clone() })?;
            path.add_link(link.id);
        }
        Ok(path)
    }

    /// Cache lookup only, never computes a path.
    pub fn lookup_path(&self, src: &NodeId, dst: &NodeId) -> Option<&Path> {
        self.path_cache.get(&(src.clone(), dst.clone()))
    }

    pub fn num_paths(&self) -> usize {
        self.path_cache.len()
    }

    /// Returns the minimum-hop path from `src` to `dst`.
    ///
    /// A cached path is returned as is. Otherwise the path is found by breadth-first search over
    /// the directional links (every link counts as one hop), cached and returned.
    /// `src == dst` yields an empty path.
    ///
    /// # Errors
    ///
    /// `Error::PathNotFound` if `dst` cannot be reached from `src`.
    pub fn calculate_shortest_path(&mut self, src: &NodeId, dst: &NodeId) -> Result<&Path> {
        let key = (src.clone(), dst.clone());

        if self.path_cache.contains_key(&key) {
            return Ok(&self.path_cache[&key]);
        }

        let Some(path) = self.breadth_first_search(src, dst) else {
            log::debug!("NoPathFound: {} => {}", src, dst);
            return Err(Error::PathNotFound { src: src.clone(), dst: dst.clone() });
        };

        log::debug!("Path found {} => {}: {} hops", src, dst, path.hop_count());
        Ok(self.path_cache.entry(key).or_insert(path))
    }

    /// Computes and caches shortest paths between every ordered pair of end nodes.
    /// Unreachable pairs are skipped.
    pub fn initialize_all_paths(&mut self) {
        let nodes: Vec<NodeId> = self.nodes.iter().cloned().collect();

        for src in &nodes {
            for dst in &nodes {
                if src == dst {
                    continue;
                }
                if let Err(e) = self.calculate_shortest_path(src, dst) {
                    log::debug!("Skipping pair {} -> {}: {}", src, dst, e);
                }
            }
        }
    }

    /// Makes sure every registered flow has a path, routing the ones without an explicit path
    /// along the shortest path. Returns the errors of flows that could not be routed.
    pub fn initialize_flow_paths(&mut self) -> Vec<Error> {
        let endpoints: Vec<(NodeId, NodeId)> = self.flows.values().map(|flow| (flow.src.clone(), flow.dst.clone())).collect();

        let mut errors = Vec::new();
        for (src, dst) in endpoints {
            if let Err(e) = self.calculate_shortest_path(&src, &dst) {
                log::warn!("Flow {} -> {} cannot be routed: {}", src, dst, e);
                errors.push(e);
            }
        }
        errors
    }

    /// The links of `path` that exist in this network.
    pub fn path_links<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Link> + 'a {
        path.links().iter().filter_map(|id| self.links.get(*id))
    }

    /// Plain BFS with unit edge weights. The first discovery of a node fixes its distance and
    /// predecessor, later discoveries over equally long routes are ignored.
    fn breadth_first_search(&self, src: &NodeId, dst: &NodeId) -> Option<Path> {
        let mut frontier: VecDeque<NodeId> = VecDeque::from([src.clone()]);
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut distances: HashMap<NodeId, usize> = HashMap::from([(src.clone(), 0)]);
        let mut predecessors: HashMap<NodeId, LinkId> = HashMap::new();

        while let Some(current) = frontier.pop_front() {
            if current == *dst {
                break;
            }
            visited.insert(current.clone());
            let depth = distances.get(&current).copied().unwrap_or_default();

            for link_id in self.outgoing_links(&current) {
                let Some(link) = self.links.get(*link_id) else {
                    continue;
                };

                // Nodes with a distance are either queued already or visited.
                if visited.contains(&link.dst) || distances.contains_key(&link.dst) {
                    continue;
                }

                distances.insert(link.dst.clone(), depth + 1);
                predecessors.insert(link.dst.clone(), *link_id);
                frontier.push_back(link.dst.clone());
            }
        }

        if !distances.contains_key(dst) {
            return None;
        }

        // Walk back from the destination.
        let mut path = Path::new(src.clone(), dst.clone());
        let mut current = dst.clone();
        while current != *src {
            let link_id = *predecessors.get(&current)?;
            path.add_link(link_id);
            current = self.links.get(link_id)?.src.clone();
        }

        Some(path)
    }
}
