use byteorder::{LittleEndian as E, ReadBytesExt};
use std::io::{self, Read};

use crate::Error;

/// Forward-only little-endian reader that tracks its byte offset.
pub struct Reader<R> {
    source: R,
    offset: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(source: R) -> Self {
        Reader { source, offset: 0 }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn fail(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::StreamTruncated {
                offset: self.offset,
            }
        } else {
            Error::StreamRead {
                offset: self.offset,
                source: err,
            }
        }
    }

    fn advance<T>(&mut self, size: u64, result: io::Result<T>) -> Result<T, Error> {
        match result {
            Ok(value) => {
                self.offset += size;
                Ok(value)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let r = self.source.read_u8();
        self.advance(1, r)
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        let r = self.source.read_i8();
        self.advance(1, r)
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let r = self.source.read_u16::<E>();
        self.advance(2, r)
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        let r = self.source.read_i16::<E>();
        self.advance(2, r)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let r = self.source.read_u32::<E>();
        self.advance(4, r)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        let r = self.source.read_f32::<E>();
        self.advance(4, r)
    }

    /// Read and throw away exactly `size` bytes.
    pub fn skip(&mut self, size: u64) -> Result<(), Error> {
        let copied = io::copy(&mut self.source.by_ref().take(size), &mut io::sink());
        let copied = self.advance(0, copied)?;
        self.offset += copied;
        if copied < size {
            return Err(Error::StreamTruncated {
                offset: self.offset,
            });
        }
        Ok(())
    }

    /// UTF-8 string with a `u16` length prefix.
    pub fn read_string(&mut self) -> Result<String, Error> {
        let len = self.read_u16()?;
        let start = self.offset;
        let mut buf = vec![0u8; len as usize];
        let r = self.source.read_exact(&mut buf);
        self.advance(len as u64, r)?;
        String::from_utf8(buf).map_err(|_| Error::InvalidString { offset: start })
    }

    /// Element count, stored as unsigned LEB128.
    pub fn read_count(&mut self) -> Result<u32, Error> {
        let start = self.offset;
        let mut value = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            let bits = (byte & 0x7F) as u32;
            if shift == 28 && bits > 0x0F {
                return Err(Error::MalformedCount { offset: start });
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::MalformedCount { offset: start })
    }

    /// Quantized positions: four `i16` per vertex.
    pub fn read_xyz(&mut self, count: usize) -> Result<Vec<[i16; 4]>, Error> {
        (0..count)
            .map(|_| {
                Ok([
                    self.read_i16()?,
                    self.read_i16()?,
                    self.read_i16()?,
                    self.read_i16()?,
                ])
            })
            .collect()
    }

    /// Quantized texture coordinates: two `i16` per vertex.
    pub fn read_uv(&mut self, count: usize) -> Result<Vec<[i16; 2]>, Error> {
        (0..count)
            .map(|_| Ok([self.read_i16()?, self.read_i16()?]))
            .collect()
    }

    /// Quantized normals: four `i8` per vertex.
    pub fn read_normals(&mut self, count: usize) -> Result<Vec<[i8; 4]>, Error> {
        (0..count)
            .map(|_| {
                Ok([
                    self.read_i8()?,
                    self.read_i8()?,
                    self.read_i8()?,
                    self.read_i8()?,
                ])
            })
            .collect()
    }

    /// Triangle index triples; indices widen to `u32` once the index stream
    /// no longer fits 16 bits.
    pub fn read_polygons(&mut self, count: usize) -> Result<Vec<[u32; 3]>, Error> {
        let wide = count * 3 >= 0x10000;
        let mut index = || -> Result<u32, Error> {
            if wide {
                self.read_u32()
            } else {
                self.read_u16().map(u32::from)
            }
        };
        (0..count)
            .map(|_| Ok([index()?, index()?, index()?]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    #[test]
    fn counts() {
        let data = [0x05, 0xAC, 0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        let mut reader = Reader::new(&data[..]);
        assert_eq!(reader.read_count().unwrap(), 5);
        assert_eq!(reader.read_count().unwrap(), 300);
        assert_eq!(reader.read_count().unwrap(), u32::MAX);
        assert_eq!(reader.offset(), data.len() as u64);
    }

    #[test]
    fn count_overflow() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
        let mut reader = Reader::new(&data[..]);
        match reader.read_count() {
            Err(Error::MalformedCount { offset: 0 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn string() {
        let mut data = Vec::new();
        data.write_u16::<E>(4).unwrap();
        data.extend_from_slice(b"body");
        data.write_u16::<E>(2).unwrap();
        data.extend_from_slice(&[0xC3, 0x28]);
        let mut reader = Reader::new(&data[..]);
        assert_eq!(reader.read_string().unwrap(), "body");
        match reader.read_string() {
            Err(Error::InvalidString { offset: 8 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncated_reports_offset() {
        let data = [1u8, 2, 3];
        let mut reader = Reader::new(&data[..]);
        reader.read_u16().unwrap();
        match reader.read_f32() {
            Err(Error::StreamTruncated { offset: 2 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn skip_short() {
        let data = [0u8; 6];
        let mut reader = Reader::new(&data[..]);
        reader.skip(4).unwrap();
        assert_eq!(reader.offset(), 4);
        match reader.skip(4) {
            Err(Error::StreamTruncated { offset: 6 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn polygon_width() {
        let mut data = Vec::new();
        for i in 0..3u16 {
            data.write_u16::<E>(i).unwrap();
        }
        let mut reader = Reader::new(&data[..]);
        assert_eq!(reader.read_polygons(1).unwrap(), vec![[0, 1, 2]]);
        assert_eq!(reader.offset(), 6);
    }
}
