use tsn_cbs_latency::domain::network::{Network, flow::Flow};
use tsn_cbs_latency::domain::utils::id::NodeId;
use tsn_cbs_latency::error::Error;

const LINK_SPEED: f64 = 100_000_000.0;
const SWITCH_DELAY: f64 = 8e-6;

fn create_small_eval_topology() -> Network {
    let mut network = Network::default();

    for node in ["N0", "N1", "N2", "N3", "CT0", "CT1"] {
        network.add_node(node);
    }
    for bridge in ["S0", "S1", "S2"] {
        network.add_bridge(bridge);
    }
    for (a, b) in [("S0", "S1"), ("S1", "S2"), ("N0", "S0"), ("N1", "S1"), ("N2", "S2"), ("N3", "S1"), ("CT0", "S0"), ("CT1", "S2")] {
        network.add_bidirectional_link(a, b, LINK_SPEED, SWITCH_DELAY, 0.0);
    }
    network
}

#[test]
fn test_small_eval_topology_counts() {
    let network = create_small_eval_topology();

    assert_eq!(network.nodes().count(), 6);
    assert_eq!(network.bridges().count(), 3);
    assert_eq!(network.num_links(), 16, "8 bidirectional links are 16 directional ones");
    assert_eq!(network.outgoing_links(&NodeId::new("S1")).len(), 4);
}

#[test]
fn test_adding_nodes_and_links_twice_changes_nothing() {
    let mut network = create_small_eval_topology();
    let first = network.get_link(&"S0".into(), &"S1".into()).unwrap().id;

    network.add_node("N0");
    network.add_bridge("S0");
    let again = network.add_link("S0", "S1", 1_000_000_000.0, 0.0, 42.0);

    assert_eq!(first, again);
    assert_eq!(network.nodes().count(), 6);
    assert_eq!(network.bridges().count(), 3);
    assert_eq!(network.num_links(), 16);

    let link = network.link(first).unwrap();
    assert_eq!(link.rate, LINK_SPEED, "the first registration wins");
    assert_eq!(link.idle_slope, 0.0);
}

#[test]
fn test_bidirectional_links_are_symmetric() {
    let network = create_small_eval_topology();

    for link in network.links() {
        let reverse = network.get_link(&link.dst, &link.src).expect("every link has a reverse link");
        assert!(reverse.is_reverse_of(link));
        assert_eq!(reverse.rate, link.rate);
        assert_eq!(reverse.delay, link.delay);
        assert_ne!(reverse.id, link.id);
    }
}

#[test]
fn test_links_are_directional() {
    let mut network = Network::default();
    network.add_node("A");
    network.add_node("B");
    network.add_link("A", "B", LINK_SPEED, 0.0, 0.0);

    assert!(network.get_link(&"A".into(), &"B".into()).is_some());
    assert!(network.get_link(&"B".into(), &"A".into()).is_none());
}

#[test]
fn test_set_idle_slope_on_missing_link() {
    let mut network = create_small_eval_topology();

    let result = network.set_link_idle_slope(&"N0".into(), &"N2".into(), 48_832_000.0);

    assert!(matches!(result, Err(Error::LinkNotFound { .. })));
}

#[test]
fn test_set_idle_slope_changes_one_direction_only() {
    let mut network = create_small_eval_topology();

    network.set_link_idle_slope(&"S0".into(), &"S1".into(), 48_832_000.0).unwrap();

    assert_eq!(network.get_link(&"S0".into(), &"S1".into()).unwrap().idle_slope, 48_832_000.0);
    assert_eq!(network.get_link(&"S1".into(), &"S0".into()).unwrap().idle_slope, 0.0);
}

#[test]
fn test_flows_are_registered_once_per_pair() {
    let mut network = create_small_eval_topology();

    let first = network.add_flow(Flow::new("N0", "N2", 750, 0.001, 0.001, 7));
    let second = network.add_flow(Flow::new("N0", "N2", 1500, 0.002, 0.002, 6));
    let reverse = network.add_flow(Flow::new("N2", "N0", 750, 0.001, 0.001, 7));

    assert_eq!(first, second);
    assert_ne!(first, reverse);
    assert_eq!(network.num_flows(), 2);
    assert_eq!(network.flow(first).unwrap().size, 750);
    assert_eq!(network.get_flow(&"N0".into(), &"N2".into()), Some(first));
    assert_eq!(network.get_flow(&"N1".into(), &"N2".into()), None);
}

#[test]
fn test_class_max_frame_follows_largest_flow() {
    let mut network = create_small_eval_topology();
    assert_eq!(network.find_class_max_frame(), 0);

    network.add_flow(Flow::new("N0", "N2", 750, 0.001, 0.001, 7));
    network.add_flow(Flow::new("N1", "N3", 1200, 0.001, 0.001, 7));
    network.add_flow(Flow::new("CT0", "CT1", 64, 0.001, 0.001, 7));

    assert_eq!(network.find_class_max_frame(), 1200);
}

#[test]
fn test_input_links_exclude_reverse_link() {
    let network = create_small_eval_topology();
    let s1_s2 = network.get_link(&"S1".into(), &"S2".into()).unwrap().id;

    // Into S1: S0, N1 and N3. S2 -> S1 is the reverse direction.
    assert_eq!(network.get_num_input_links(s1_s2, false), 3);
    assert_eq!(network.get_input_idle_slopes(s1_s2), vec![0.0, 0.0, 0.0]);
}
