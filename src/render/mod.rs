pub(crate) mod composite;
pub(crate) mod cpu;
pub(crate) mod scheduler;
pub(crate) mod surface;
pub(crate) mod visualizer;
pub(crate) mod waveform;
