#[path = "compress/roundtrip.rs"]
mod roundtrip;
#[path = "compress/splitter.rs"]
mod splitter;
