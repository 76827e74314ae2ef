//! Input bitstream with word-at-a-time refill and overrun tolerance.

/// Number of bits the buffer is guaranteed to hold after a refill.
pub const GUARANTEED_BITS_AFTER_REFILL: u32 = 56;

/// Reads bits LSB-first from a byte slice.
///
/// Reads past the end of the input are tolerated: the refill substitutes
/// zero bytes and counts them in `overrun`, so the decode loops can run
/// without per-read bounds checks and detect truncation afterwards.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bitbuf: u64,
    bitsleft: u32,
    overrun: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        BitReader { data, pos: 0, bitbuf: 0, bitsleft: 0, overrun: 0 }
    }

    /// Top the buffer up to at least [`GUARANTEED_BITS_AFTER_REFILL`] bits.
    #[inline(always)]
    pub fn refill(&mut self) {
        if let Some(bytes) = self.data.get(self.pos..self.pos + 8) {
            let word = u64::from_le_bytes(bytes.try_into().unwrap());
            self.bitbuf |= word << self.bitsleft;
            // 63 is all-ones below the word size, so xor doubles as
            // subtraction here.
            self.pos += ((63 ^ self.bitsleft) >> 3) as usize;
            self.bitsleft |= GUARANTEED_BITS_AFTER_REFILL;
        } else {
            self.refill_slow();
        }
    }

    #[inline(never)]
    fn refill_slow(&mut self) {
        while self.bitsleft < GUARANTEED_BITS_AFTER_REFILL {
            if self.pos < self.data.len() {
                self.bitbuf |= u64::from(self.data[self.pos]) << self.bitsleft;
                self.pos += 1;
            } else {
                // Phantom zero byte past the end of the input.
                self.overrun += 1;
            }
            self.bitsleft += 8;
        }
    }

    /// Refill only when fewer than `n` bits are buffered.
    #[inline(always)]
    pub fn ensure(&mut self, n: u32) {
        debug_assert!(n <= GUARANTEED_BITS_AFTER_REFILL);
        if self.bitsleft < n {
            self.refill();
        }
    }

    /// The raw buffer contents; the low `bitsleft` bits are valid.
    #[inline(always)]
    pub fn peek_all(&self) -> u64 {
        self.bitbuf
    }

    /// The low `n` bits of the buffer, without consuming them.
    #[inline(always)]
    pub fn peek(&self, n: u32) -> u64 {
        debug_assert!(n >= 1 && n <= 57);
        self.bitbuf & ((1u64 << n) - 1)
    }

    /// Discard the low `n` bits.
    #[inline(always)]
    pub fn consume(&mut self, n: u32) {
        debug_assert!(self.bitsleft >= n);
        self.bitbuf >>= n;
        self.bitsleft -= n;
    }

    /// Read and consume the low `n` bits.
    #[inline(always)]
    pub fn pop_bits(&mut self, n: u32) -> u64 {
        let v = self.peek(n);
        self.consume(n);
        v
    }

    #[inline(always)]
    pub fn bits_left(&self) -> u32 {
        self.bitsleft
    }

    /// Number of phantom zero bytes drawn past the end of the input.
    #[inline(always)]
    pub fn overrun_count(&self) -> u32 {
        self.overrun
    }

    /// True if bits that never existed in the input have been consumed.
    pub fn consumed_phantom_bytes(&self) -> bool {
        self.overrun > (self.bitsleft >> 3)
    }

    /// Byte position of the underlying cursor.  Lags the logical position
    /// by however many whole bytes are still buffered.
    pub fn raw_position(&self) -> usize {
        self.pos
    }

    /// Discard bits up to the next byte boundary and roll fully-buffered
    /// bytes back into the cursor.  Phantom bytes were never read, so they
    /// are not rolled back.
    pub fn align_to_byte(&mut self) {
        self.consume(self.bitsleft & 7);
        let buffered = (self.bitsleft >> 3) as usize;
        let phantom = (self.overrun as usize).min(buffered);
        self.pos -= buffered - phantom;
        self.overrun -= phantom as u32;
        self.bitbuf = 0;
        self.bitsleft = 0;
    }

    /// Number of input bytes remaining at the cursor.  Only meaningful
    /// right after [`Self::align_to_byte`].
    pub fn bytes_remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Copy `n` bytes from the cursor into `dst` and advance.  The reader
    /// must be byte-aligned with an empty buffer.  Returns false if fewer
    /// than `n` bytes remain.
    pub fn copy_bytes(&mut self, dst: &mut [u8]) -> bool {
        debug_assert!(self.bitsleft == 0);
        match self.data.get(self.pos..self.pos + dst.len()) {
            Some(src) => {
                dst.copy_from_slice(src);
                self.pos += dst.len();
                true
            }
            None => false,
        }
    }

    /// Read a 16-bit little-endian field at the (byte-aligned) cursor.
    pub fn read_u16_le(&mut self) -> Option<u16> {
        debug_assert!(self.bitsleft == 0);
        let bytes = self.data.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}
