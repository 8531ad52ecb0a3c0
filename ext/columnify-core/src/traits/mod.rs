mod sink;

pub use sink::RecordSink;
