//! Bit-granular I/O over byte buffers.
//!
//! DEFLATE packs everything LSB-first: integer fields start at the low bit
//! of the current byte, and Huffman codewords are stored bit-reversed so
//! that they too are consumed from the low end.  Both directions buffer a
//! machine word at a time.

mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;
