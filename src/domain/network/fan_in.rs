use crate::domain::network::{Network, link::Link};
use crate::domain::utils::id::LinkId;

impl Network {
    /// The links feeding the node `link` departs from, except the direct reverse of `link`.
    ///
    /// These are the upstream ports whose traffic contends for the output port of `link`.
    /// Parallel links between the same ordered pair cannot exist, so excluding the reverse
    /// link is the only exclusion needed.
    pub fn input_links<'a>(&'a self, link: &'a Link) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.values().filter(move |l| l.dst == link.src && !l.is_reverse_of(link))
    }

    /// Idle slopes of all input links of `link`, in link registration order.
    pub fn get_input_idle_slopes(&self, link: LinkId) -> Vec<f64> {
        let Some(link) = self.links.get(link) else {
            return Vec::new();
        };
        self.input_links(link).map(|l| l.idle_slope).collect()
    }

    /// Number of input links of `link`. With `only_count_links_with_flows`, only links that carry
    /// at least one registered flow are counted.
    pub fn get_num_input_links(&self, link: LinkId, only_count_links_with_flows: bool) -> usize {
        let Some(link) = self.links.get(link) else {
            return 0;
        };
        self.input_links(link).filter(|l| !only_count_links_with_flows || self.exists_flow_on_link(l.id)).count()
    }

    /// Largest registered flow frame size in bytes, used as the class maximum frame.
    /// Assumes all registered flows belong to the same class. `0` without flows.
    pub fn find_class_max_frame(&self) -> u32 {
        self.flows.values().map(|flow| flow.size).max().unwrap_or(0)
    }

    /// True if the cached path of any registered flow traverses `link`.
    pub fn exists_flow_on_link(&self, link: LinkId) -> bool {
        self.flows.values().any(|flow| self.lookup_path(&flow.src, &flow.dst).is_some_and(|path| path.contains(link)))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::network::{Network, flow::Flow};

    /// Star around bridge S0 with three end stations and one flow N0 -> N1.
    fn star_network() -> Network {
        let mut network = Network::default();
        for node in ["N0", "N1", "N2"] {
            network.add_node(node);
            network.add_bidirectional_link(node, "S0", 100e6, 0.0, 0.0);
        }
        network.add_bridge("S0");
        network.add_flow(Flow::new("N0", "N1", 750, 0.001, 0.001, 7));
        network.calculate_shortest_path(&"N0".into(), &"N1".into()).unwrap();
        network
    }

    #[test]
    fn test_input_links_exclude_reverse_direction() {
        let mut network = star_network();
        network.set_link_idle_slope(&"N0".into(), &"S0".into(), 10.0).unwrap();
        network.set_link_idle_slope(&"N2".into(), &"S0".into(), 20.0).unwrap();
        network.set_link_idle_slope(&"N1".into(), &"S0".into(), 99.0).unwrap();

        let output = network.get_link(&"S0".into(), &"N1".into()).unwrap().id;

        assert_eq!(network.get_input_idle_slopes(output), vec![10.0, 20.0]);
        assert_eq!(network.get_num_input_links(output, false), 2);
    }

    #[test]
    fn test_num_input_links_only_with_flows() {
        let network = star_network();
        let output = network.get_link(&"S0".into(), &"N1".into()).unwrap().id;

        // Only N0 -> S0 carries the registered flow.
        assert_eq!(network.get_num_input_links(output, true), 1);
    }

    #[test]
    fn test_class_max_frame_and_flow_presence() {
        let mut network = star_network();
        network.add_flow(Flow::new("N2", "N1", 1200, 0.001, 0.001, 7));

        assert_eq!(network.find_class_max_frame(), 1200);

        let used = network.get_link(&"S0".into(), &"N1".into()).unwrap().id;
        let unused = network.get_link(&"S0".into(), &"N2".into()).unwrap().id;
        assert!(network.exists_flow_on_link(used));
        assert!(!network.exists_flow_on_link(unused));
    }

    #[test]
    fn test_empty_network_has_no_class_frame() {
        assert_eq!(Network::default().find_class_max_frame(), 0);
    }
}
