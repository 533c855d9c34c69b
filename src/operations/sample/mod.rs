mod sample_polyline;

pub use sample_polyline::{DegenerateSegments, PolylineSampling, SamplePolyline, SegmentSample};
