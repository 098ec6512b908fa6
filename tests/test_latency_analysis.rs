use tsn_cbs_latency::domain::analysis::latency_analysis::{AnalysisConfig, NetworkLatencyAnalysis};
use tsn_cbs_latency::domain::cbs::delay_bounds::{Algorithm, DelayBounds};
use tsn_cbs_latency::domain::cbs::port::PortParameters;
use tsn_cbs_latency::domain::network::flow::Flow;
use tsn_cbs_latency::domain::utils::id::{FlowId, NodeId};
use tsn_cbs_latency::error::Error;

const LINK_SPEED: f64 = 100_000_000.0;
const CMI: f64 = 125e-6;
const SWITCH_DELAY: f64 = 8e-6;
const IDLE_SLOPE: f64 = 48_832_000.0;

/// 750 byte frame plus IFG at 100 Mbit/s.
const TRANSMISSION_DELAY: f64 = 0.00006096;

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-12_f64.max(expected.abs() * 1e-9);
    assert!((actual - expected).abs() <= tolerance, "expected {}, got {}", expected, actual);
}

fn assert_bounds(actual: &DelayBounds, expected: &DelayBounds) {
    for algorithm in Algorithm::ALL {
        let (a, e) = (actual.get(algorithm), expected.get(algorithm));
        let tolerance = 1e-12_f64.max(e.abs() * 1e-9);
        assert!((a - e).abs() <= tolerance, "{}: expected {}, got {}", algorithm, e, a);
    }
}

fn analysis_config() -> AnalysisConfig {
    AnalysisConfig { link_speed: LINK_SPEED, cmi: CMI, switch_delay: SWITCH_DELAY, ..AnalysisConfig::default() }
}

/// Three bridges in a line, end stations around them and one 750 byte flow N0 -> N2.
fn create_small_eval_network() -> (NetworkLatencyAnalysis, FlowId) {
    let mut analysis = NetworkLatencyAnalysis::new(analysis_config()).unwrap();
    let network = &mut analysis.network;

    for node in ["N0", "N1", "N2", "N3", "CT0", "CT1"] {
        network.add_node(node);
    }
    for bridge in ["S0", "S1", "S2"] {
        network.add_bridge(bridge);
    }
    for (a, b) in [("S0", "S1"), ("S1", "S2"), ("N0", "S0"), ("N1", "S1"), ("N2", "S2"), ("N3", "S1"), ("CT0", "S0"), ("CT1", "S2")] {
        network.add_bidirectional_link(a, b, LINK_SPEED, SWITCH_DELAY, 0.0);
    }

    let flow = network.add_flow(Flow::new("N0", "N2", 750, 0.001, 0.001, 7));
    network.calculate_shortest_path(&"N0".into(), &"N2".into()).unwrap();
    (analysis, flow)
}

fn set_path_idle_slopes(analysis: &mut NetworkLatencyAnalysis, idle_slope: f64) {
    for (src, dst) in [("N0", "S0"), ("S0", "S1"), ("S1", "S2"), ("S2", "N2")] {
        analysis.network.set_link_idle_slope(&src.into(), &dst.into(), idle_slope).unwrap();
    }
}

#[test]
fn test_small_eval_network_end_to_end() {
    let (mut analysis, flow) = create_small_eval_network();
    set_path_idle_slopes(&mut analysis, IDLE_SLOPE);

    let bounds = analysis.calculate_end_to_end_delay_for_flow(flow).unwrap();

    assert_bounds(
        &bounds,
        &DelayBounds {
            ba_standard: 0.0008174514809960679,
            q_standard_l3_v1: 0.0017733592495309573,
            q_standard_l3_v2: 0.0039487964978111335,
            q_standard_l3_v3: 0.0025439984990619146,
            plenary_100_mbit: 0.00081984,
            plenary_faster_media: 0.00101196,
            plenary_faster_media_v2: 0.0010065714809960682,
        },
    );
}

#[test]
fn test_small_eval_network_with_flow_interval_as_cmi() {
    let (mut analysis, flow) = create_small_eval_network();
    set_path_idle_slopes(&mut analysis, IDLE_SLOPE);

    let results = analysis.calculate_end_to_end_delays(true);

    assert_bounds(
        results[&flow].as_ref().unwrap(),
        &DelayBounds {
            ba_standard: 0.0034424514809960685,
            q_standard_l3_v1: 0.0017733592495309573,
            q_standard_l3_v2: 0.0039487964978111335,
            q_standard_l3_v3: 0.0025439984990619146,
            plenary_100_mbit: 0.0023156,
            plenary_faster_media: 0.0036369600000000007,
            plenary_faster_media_v2: 0.0036315714809960695,
        },
    );

    // The configured CMI is untouched by the pass above.
    let again = analysis.calculate_end_to_end_delays(false);
    assert_close(again[&flow].as_ref().unwrap().ba_standard, 0.0008174514809960679);
    assert_close(analysis.calculator().cmi(), CMI);
}

#[test]
fn test_small_eval_network_idle_slopes_from_flows() {
    let (mut analysis, flow) = create_small_eval_network();

    let warnings = analysis.network.calculate_link_idle_slopes_from_flows(CMI).unwrap();
    assert!(warnings.is_empty());
    assert_close(analysis.network.get_link(&"S0".into(), &"S1".into()).unwrap().idle_slope, 48_768_000.0);

    let bounds = analysis.calculate_end_to_end_delay_for_flow(flow).unwrap();

    assert_bounds(
        &bounds,
        &DelayBounds {
            ba_standard: 0.0008169599999999998,
            q_standard_l3_v1: 0.0017720115927545286,
            q_standard_l3_v2: 0.003942507432854466,
            q_standard_l3_v3: 0.0025413031855090577,
            plenary_100_mbit: 0.00081984,
            plenary_faster_media: 0.00101196,
            plenary_faster_media_v2: 0.00100608,
        },
    );
}

#[test]
fn test_queue_delay_at_fan_in_port() {
    let (mut analysis, flow) = create_small_eval_network();
    set_path_idle_slopes(&mut analysis, IDLE_SLOPE);
    let link = analysis.network.get_link(&"S1".into(), &"S2".into()).unwrap().id;
    let flow = analysis.network.flow(flow).unwrap().clone();

    assert_eq!(analysis.network.get_input_idle_slopes(link), vec![IDLE_SLOPE, 0.0, 0.0]);

    let bounds = analysis.calculate_queue_delay_for_link(link, &flow, None).unwrap();

    assert_bounds(
        &bounds,
        &DelayBounds {
            ba_standard: 0.00018320382699868937,
            q_standard_l3_v1: 0.0005424797498436523,
            q_standard_l3_v2: 0.0015423984990619141,
            q_standard_l3_v3: 0.0008399994996873047,
            plenary_100_mbit: 0.000184,
            plenary_faster_media: 0.00024804,
            plenary_faster_media_v2: 0.0002462438269986894,
        },
    );
}

#[test]
fn test_end_to_end_is_sum_of_hops() {
    let (mut analysis, flow_id) = create_small_eval_network();
    set_path_idle_slopes(&mut analysis, IDLE_SLOPE);
    let flow = analysis.network.flow(flow_id).unwrap().clone();
    let path = analysis.network.lookup_path(&flow.src, &flow.dst).unwrap().clone();
    let class_max_frame = analysis.class_max_frame_bits();

    let mut expected = DelayBounds::zero();
    for link in path.links() {
        let src = analysis.network.link(*link).unwrap().src.clone();
        expected += analysis.calculate_queue_delay_for_link(*link, &flow, Some(class_max_frame)).unwrap();
        expected += DelayBounds::uniform(TRANSMISSION_DELAY);
        if analysis.network.is_bridge(&src) {
            expected += DelayBounds::uniform(SWITCH_DELAY);
        }
    }

    let bounds = analysis.calculate_end_to_end_delay_for_flow(flow_id).unwrap();

    assert_bounds(&bounds, &expected);
    assert_close(analysis.transmission_delay(&flow), TRANSMISSION_DELAY);
}

#[test]
fn test_bridge_only_path_counts_every_hop() {
    let mut analysis = NetworkLatencyAnalysis::new(analysis_config()).unwrap();
    let bridges = ["B0", "B1", "B2", "B3", "B4"];
    for bridge in bridges {
        analysis.network.add_bridge(bridge);
    }
    for pair in bridges.windows(2) {
        analysis.network.add_bidirectional_link(pair[0], pair[1], LINK_SPEED, SWITCH_DELAY, 0.0);
        analysis.network.set_link_idle_slope(&pair[0].into(), &pair[1].into(), IDLE_SLOPE).unwrap();
    }
    let flow = analysis.network.add_flow(Flow::new("B0", "B4", 750, 0.001, 0.001, 7));
    analysis.network.calculate_shortest_path(&"B0".into(), &"B4".into()).unwrap();

    let bounds = analysis.calculate_end_to_end_delay_for_flow(flow).unwrap();

    let per_hop = TRANSMISSION_DELAY + SWITCH_DELAY;
    assert_close(bounds.ba_standard, 4.0 * (0.00018320382699868937 + per_hop));
    assert_close(bounds.ba_standard, 0.0010086553079947575);
    assert_close(bounds.plenary_100_mbit, 4.0 * (0.000184 + per_hop));
    assert_close(bounds.plenary_faster_media, 4.0 * (0.00024804 + per_hop));
    assert_close(bounds.plenary_faster_media_v2, 4.0 * (0.0002462438269986894 + per_hop));
}

#[test]
fn test_network_without_flows_has_no_queueing() {
    let mut analysis = NetworkLatencyAnalysis::new(analysis_config()).unwrap();
    analysis.network.add_bridge("S0");
    analysis.network.add_bridge("S1");
    analysis.network.add_link("S0", "S1", LINK_SPEED, SWITCH_DELAY, IDLE_SLOPE);
    let link = analysis.network.get_link(&"S0".into(), &"S1".into()).unwrap().id;
    let unregistered = Flow::new("S0", "S1", 750, 0.001, 0.001, 7);

    let bounds = analysis.calculate_queue_delay_for_link(link, &unregistered, None).unwrap();

    assert_eq!(bounds, DelayBounds::zero());
    assert!(analysis.calculate_end_to_end_delays(false).is_empty());
}

#[test]
fn test_flow_without_path_reports_path_not_found() {
    let (mut analysis, _) = create_small_eval_network();
    let isolated = analysis.network.add_flow(Flow::new("N1", "N3", 750, 0.001, 0.001, 7));

    let result = analysis.calculate_end_to_end_delay_for_flow(isolated);

    match result {
        Err(Error::PathNotFound { src, dst }) => {
            assert_eq!(src, NodeId::new("N1"));
            assert_eq!(dst, NodeId::new("N3"));
        }
        other => panic!("expected PathNotFound, got {:?}", other),
    }
}

#[test]
fn test_over_reservation_is_reported() {
    let (mut analysis, _) = create_small_eval_network();
    // 12 kB every 125 us is 768 Mbit/s on a 100 Mbit/s link.
    analysis.network.add_flow(Flow::new("N1", "N3", 12_000, 0.001, 0.001, 7));
    analysis.network.initialize_flow_paths();

    let warnings = analysis.network.calculate_link_idle_slopes_from_flows(CMI).unwrap();

    let over_reserved: Vec<(String, String)> = warnings.iter().map(|w| (w.src.to_string(), w.dst.to_string())).collect();
    assert_eq!(over_reserved.len(), 2);
    assert!(over_reserved.contains(&("N1".to_string(), "S1".to_string())));
    assert!(over_reserved.contains(&("S1".to_string(), "N3".to_string())));
    assert!(warnings.iter().all(|w| w.idle_slope > w.rate));
}

#[test]
fn test_bounds_are_non_negative_and_non_decreasing_in_idle_slope() {
    let analysis = NetworkLatencyAnalysis::new(analysis_config()).unwrap();
    let calculator = analysis.calculator();
    let stream_max_frame = 750.0 * 8.0 + 96.0;

    let mut previous: Option<DelayBounds> = None;
    for step in 1..19 {
        let idle_slope = step as f64 * 5_000_000.0;
        let port = PortParameters {
            idle_slope,
            stream_max_frame,
            class_max_frame: stream_max_frame,
            nr_input_links: 2,
            input_idle_slopes: vec![idle_slope, 0.0],
        };

        let bounds = calculator.run_algorithms_for_port(&port, CMI).unwrap();

        for (algorithm, value) in bounds.iter() {
            assert!(value >= 0.0, "{} negative at idle slope {}", algorithm, idle_slope);
        }
        if let Some(previous) = previous {
            assert!(bounds.ba_standard >= previous.ba_standard - 1e-15);
            assert!(bounds.plenary_faster_media_v2 >= previous.plenary_faster_media_v2 - 1e-15);
        }
        previous = Some(bounds);
    }
}
