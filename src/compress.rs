use std::{
    fmt,
    io::{self, Cursor, Read, Write},
};

/// Compression applied to the body of a persisted patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CompressionType {
    /// GZip (RFC1952)
    Gzip,
    /// Zlib (RFC1950)
    #[default]
    Zlib,
    /// Uncompressed
    No,
    /// LZ4
    LZ4,
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Gzip => "GZip",
                Self::Zlib => "Zlib",
                Self::No => "No",
                Self::LZ4 => "LZ4",
            }
        )
    }
}

impl CompressionType {
    pub fn to_magic(&self) -> u8 {
        match self {
            CompressionType::Gzip => 1,
            CompressionType::Zlib => 2,
            CompressionType::No => 3,
            CompressionType::LZ4 => 4,
        }
    }

    pub fn from_magic(magic: u8) -> Option<Self> {
        match magic {
            1 => Some(CompressionType::Gzip),
            2 => Some(CompressionType::Zlib),
            3 => Some(CompressionType::No),
            4 => Some(CompressionType::LZ4),
            _ => None,
        }
    }

    pub fn compress_all<T: AsRef<[u8]>>(&self, data: T) -> io::Result<Vec<u8>> {
        let mut reader = Cursor::new(data);
        let mut result = Vec::new();
        self.compress(&mut reader, &mut result)?;
        Ok(result)
    }

    pub fn decompress_all<T: AsRef<[u8]>>(&self, data: T) -> io::Result<Vec<u8>> {
        let mut reader = Cursor::new(data);
        let mut result = Vec::new();
        self.decompress(&mut reader, &mut result)?;
        Ok(result)
    }

    pub fn compress(&self, input: &mut impl Read, output: &mut impl Write) -> io::Result<()> {
        match self {
            CompressionType::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(output, flate2::Compression::default());
                io::copy(input, &mut encoder)?;
                encoder.finish()?;
            }
            CompressionType::Zlib => {
                let mut encoder =
                    flate2::write::ZlibEncoder::new(output, flate2::Compression::default());
                io::copy(input, &mut encoder)?;
                encoder.finish()?;
            }
            CompressionType::No => {
                io::copy(input, output)?;
            }
            CompressionType::LZ4 => {
                let mut encoder = lz4_flex::frame::FrameEncoder::new(output);
                io::copy(input, &mut encoder)?;
                encoder.finish().map_err(io::Error::other)?;
            }
        }
        Ok(())
    }

    pub fn decompress(&self, input: &mut impl Read, output: &mut impl Write) -> io::Result<()> {
        match self {
            CompressionType::Gzip => {
                let mut decoder = flate2::write::GzDecoder::new(output);
                io::copy(input, &mut decoder)?;
                decoder.finish()?;
            }
            CompressionType::Zlib => {
                let mut decoder = flate2::write::ZlibDecoder::new(output);
                io::copy(input, &mut decoder)?;
                decoder.finish()?;
            }
            CompressionType::No => {
                io::copy(input, output)?;
            }
            CompressionType::LZ4 => {
                let mut decoder = lz4_flex::frame::FrameDecoder::new(input);
                io::copy(&mut decoder, output)?;
            }
        }
        Ok(())
    }
}
