use super::h264_error::H264Error;

/// MSB-first bit reader over an RBSP (emulation prevention already removed).
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// # Errors
    /// `EndOfData` past the last bit.
    pub fn read_bit(&mut self) -> Result<bool, H264Error> {
        let byte = self.data.get(self.pos / 8).ok_or(H264Error::EndOfData)?;
        let bit = (byte >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Ok(bit == 1)
    }

    /// Reads `n <= 32` bits.
    ///
    /// # Errors
    /// `EndOfData` past the last bit.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, H264Error> {
        debug_assert!(n <= 32);
        let mut v = 0u32;
        for _ in 0..n {
            v = (v << 1) | u32::from(self.read_bit()?);
        }
        Ok(v)
    }

    /// # Errors
    /// `EndOfData` past the last bit.
    pub fn skip_bits(&mut self, n: usize) -> Result<(), H264Error> {
        if self.pos + n > self.data.len() * 8 {
            return Err(H264Error::EndOfData);
        }
        self.pos += n;
        Ok(())
    }

    /// Unsigned exp-Golomb, `ue(v)`.
    ///
    /// # Errors
    /// `EndOfData` or `ExpGolombOverflow`.
    pub fn read_ue(&mut self) -> Result<u32, H264Error> {
        let mut zeros = 0u32;
        while !self.read_bit()? {
            zeros += 1;
            if zeros > 31 {
                return Err(H264Error::ExpGolombOverflow);
            }
        }
        if zeros == 0 {
            return Ok(0);
        }
        let suffix = self.read_bits(zeros)?;
        Ok(((1u64 << zeros) - 1 + u64::from(suffix)).try_into().unwrap_or(u32::MAX))
    }

    /// Signed exp-Golomb, `se(v)`.
    ///
    /// # Errors
    /// Same as [`read_ue`](Self::read_ue).
    pub fn read_se(&mut self) -> Result<i32, H264Error> {
        let k = i64::from(self.read_ue()?);
        let v = if k % 2 == 1 { (k + 1) / 2 } else { -(k / 2) };
        Ok(i32::try_from(v).unwrap_or(i32::MAX))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn exp_golomb_codes() {
        // 1 | 010 | 011 | 00100 | 00101 -> ue: 0,1,2,3,4
        let data = [0b1010_0110, 0b0100_0010, 0b1000_0000];
        let mut br = BitReader::new(&data);
        for expect in 0..5 {
            assert_eq!(br.read_ue().unwrap(), expect);
        }
    }

    #[test]
    fn signed_mapping() {
        // ue 1,2,3,4 -> se 1,-1,2,-2
        let data = [0b0100_1100, 0b1000_0101, 0b0000_0000];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_se().unwrap(), 1);
        assert_eq!(br.read_se().unwrap(), -1);
        assert_eq!(br.read_se().unwrap(), 2);
        assert_eq!(br.read_se().unwrap(), -2);
    }

    #[test]
    fn end_of_data() {
        let mut br = BitReader::new(&[0xFF]);
        assert_eq!(br.read_bits(8).unwrap(), 0xFF);
        assert_eq!(br.read_bit(), Err(H264Error::EndOfData));
        assert_eq!(BitReader::new(&[0, 0]).read_ue(), Err(H264Error::EndOfData));
        assert_eq!(BitReader::new(&[0]).skip_bits(9), Err(H264Error::EndOfData));
    }
}
