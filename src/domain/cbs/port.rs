/// Everything the formulas need to know about one output port.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortParameters {
    /// Idle slope of the class on this port in bit/s.
    pub idle_slope: f64,

    /// Maximum frame of the analysed stream in bits, including IFG.
    pub stream_max_frame: f64,

    /// Maximum frame of all class streams sharing the port in bits, including IFG.
    pub class_max_frame: f64,

    /// Number of links feeding this port (fan-in).
    pub nr_input_links: usize,

    /// Idle slopes of the links feeding this port in bit/s.
    pub input_idle_slopes: Vec<f64>,
}
