pub mod fan_in;
pub mod flow;
pub mod link;
pub mod path;
pub mod reservation;
pub mod routing;

use std::collections::{BTreeSet, HashMap};

use slotmap::SlotMap;

use crate::domain::network::{flow::Flow, link::Link, path::Path};
use crate::domain::utils::id::{FlowId, LinkId, NodeId};
use crate::error::{Error, Result};

/// Default interframe gap in bits.
pub const DEFAULT_IFG_BITS: u32 = 96;

/// Models the switched network the latency analysis runs on.
///
/// The `Network` is the graph representation of the system. It manages:
/// * **Physical Layer**: End nodes, bridges and directional links.
/// * **Traffic**: The registered flows of the CBS class.
/// * **Routing**: A cache of one path per ordered `(src, dst)` pair.
///
/// Topology is built once by a scenario and only idle slopes change afterwards. Cached paths
/// are never invalidated, so links added after a path was computed do not show up in it.
#[derive(Debug, Clone)]
pub struct Network {
    /// End stations. Links leaving an end station have no CBS queue.
    nodes: BTreeSet<NodeId>,

    /// Bridges add a fixed switching delay to every hop leaving them.
    bridges: BTreeSet<NodeId>,

    links: SlotMap<LinkId, Link>,

    /// Maps an ordered `(src, dst)` pair to its link. At most one link per pair.
    link_index: HashMap<(NodeId, NodeId), LinkId>,

    /// Outgoing links per node, in insertion order.
    adjacency: HashMap<NodeId, Vec<LinkId>>,

    flows: SlotMap<FlowId, Flow>,

    /// Maps an ordered `(src, dst)` pair to its flow. At most one flow per pair.
    flow_index: HashMap<(NodeId, NodeId), FlowId>,

    /// Registered or computed paths, one per ordered `(src, dst)` pair.
    path_cache: HashMap<(NodeId, NodeId), Path>,

    /// Interframe gap in bits.
    ifg_bits: u32,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(DEFAULT_IFG_BITS)
    }
}

impl Network {
    pub fn new(ifg_bits: u32) -> Self {
        Self {
            nodes: BTreeSet::new(),
            bridges: BTreeSet::new(),
            links: SlotMap::with_key(),
            link_index: HashMap::new(),
            adjacency: HashMap::new(),
            flows: SlotMap::with_key(),
            flow_index: HashMap::new(),
            path_cache: HashMap::new(),
            ifg_bits,
        }
    }

    pub fn ifg_bits(&self) -> u32 {
        self.ifg_bits
    }

    //---------------------
    // --- Node Methods ---
    //---------------------
    pub fn add_node(&mut self, node: impl Into<NodeId>) {
        self.nodes.insert(node.into());
    }

    pub fn add_bridge(&mut self, bridge: impl Into<NodeId>) {
        self.bridges.insert(bridge.into());
    }

    pub fn is_end_node(&self, node: &NodeId) -> bool {
        self.nodes.contains(node)
    }

    pub fn is_bridge(&self, node: &NodeId) -> bool {
        self.bridges.contains(node)
    }

    /// True if the id was registered either as end node or as bridge.
    pub fn is_known_node(&self, node: &NodeId) -> bool {
        self.is_end_node(node) || self.is_bridge(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn bridges(&self) -> impl Iterator<Item = &NodeId> {
        self.bridges.iter()
    }

    //---------------------
    // --- Link Methods ---
    //---------------------

    /// Adds a directional link from `src` to `dst`.
    ///
    /// If a link for this direction already exists it is left untouched and its id returned.
    pub fn add_link(&mut self, src: impl Into<NodeId>, dst: impl Into<NodeId>, rate: f64, delay: f64, idle_slope: f64) -> LinkId {
        let src = src.into();
        let dst = dst.into();

        if let Some(existing) = self.link_index.get(&(src.clone(), dst.clone())) {
            log::debug!("Link {} -> {} already exists, keeping the existing one.", src, dst);
            return *existing;
        }

        let link_id =
            self.links.insert_with_key(|id| Link { id, src: src.clone(), dst: dst.clone(), rate, delay, idle_slope });

        self.adjacency.entry(src.clone()).or_default().push(link_id);
        self.link_index.insert((src, dst), link_id);
        link_id
    }

    /// Adds one link per direction. Both share rate and delay but get independent idle slopes.
    pub fn add_bidirectional_link(
        &mut self,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
        rate: f64,
        delay: f64,
        idle_slope: f64,
    ) -> (LinkId, LinkId) {
        let a = a.into();
        let b = b.into();

        let forward = self.add_link(a.clone(), b.clone(), rate, delay, idle_slope);
        let backward = self.add_link(b, a, rate, delay, idle_slope);
        (forward, backward)
    }

    /// Exact-direction lookup.
    pub fn get_link(&self, src: &NodeId, dst: &NodeId) -> Option<&Link> {
        self.link_index.get(&(src.clone(), dst.clone())).and_then(|id| self.links.get(*id))
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    /// All links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn outgoing_links(&self, node: &NodeId) -> &[LinkId] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_link_idle_slope(&mut self, src: &NodeId, dst: &NodeId, idle_slope: f64) -> Result<()> {
        let link_id = *self
            .link_index
            .get(&(src.clone(), dst.clone()))
            .ok_or_else(|| Error::LinkNotFound { src: src.clone(), dst: dst.clone() })?;

        if let Some(link) = self.links.get_mut(link_id) {
            link.idle_slope = idle_slope;
        }
        Ok(())
    }

    //---------------------
    // --- Flow Methods ---
    //---------------------

    /// Registers a flow. A second flow for the same `(src, dst)` pair is ignored and the id of
    /// the existing one returned.
    pub fn add_flow(&mut self, flow: Flow) -> FlowId {
        let key = (flow.src.clone(), flow.dst.clone());

        if let Some(existing) = self.flow_index.get(&key) {
            log::debug!("Flow {} -> {} already registered, ignoring {}.", key.0, key.1, flow);
            return *existing;
        }

        let flow_id = self.flows.insert(flow);
        self.flow_index.insert(key, flow_id);
        flow_id
    }

    pub fn get_flow(&self, src: &NodeId, dst: &NodeId) -> Option<FlowId> {
        self.flow_index.get(&(src.clone(), dst.clone())).copied()
    }

    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(id)
    }

    /// All flows in registration order.
    pub fn flows(&self) -> impl Iterator<Item = (FlowId, &Flow)> {
        self.flows.iter()
    }

    pub fn num_flows(&self) -> usize {
        self.flows.len()
    }
}
