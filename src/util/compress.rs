use crate::{Compression, Error, Result};

use brotli::{CompressorWriter as BrotliEncoder, Decompressor as BrotliDecoder};
use flate2::{read::GzDecoder, write::GzEncoder};
#[cfg(not(target_arch = "wasm32"))]
use zstd::{Decoder as ZSTDDecoder, Encoder as ZSTDEncoder};

use std::io::{Cursor, Read, Write};

/// Returns a new instance of [`std::io::Write`] that will emit compressed data to the underlying writer.
///
/// The compressed stream is finished when the returned writer is dropped.
///
/// # Arguments
/// * `compression` - Compression to use
/// * `writer` - Underlying writer to write compressed data to
///
/// # Errors
/// Will return [`Err`] if `compression` is not [supported](Compression::is_supported)
/// or an error occurred while creating the zstd encoder.
pub fn compress<'a>(
    compression: Compression,
    writer: &'a mut impl Write,
) -> Result<Box<dyn Write + 'a>> {
    if !compression.is_supported() {
        return Err(Error::UnsupportedCompression(compression));
    }

    match compression {
        Compression::None => Ok(Box::new(writer)),
        Compression::GZip => Ok(Box::new(GzEncoder::new(
            writer,
            flate2::Compression::default(),
        ))),
        Compression::Brotli => Ok(Box::new(BrotliEncoder::new(writer, 4096, 11, 24))),
        #[cfg(not(target_arch = "wasm32"))]
        Compression::ZStd => Ok(Box::new(ZSTDEncoder::new(writer, 0)?.auto_finish())),
        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedCompression(compression)),
    }
}

/// Compresses a byte slice and returns the result as a new [`Vec<u8>`].
///
/// # Arguments
/// * `compression` - Compression to use
/// * `data` - Data to compress
///
/// # Errors
/// Will return [`Err`] if `compression` is not supported (see [`compress`]) or the
/// encoder failed.
///
/// # Example
/// ```rust
/// # use pmtiles_index::{util::{compress_all, decompress_all}, Compression};
/// let data: Vec<u8> = vec![1, 3, 3, 7, 0, 4, 2, 0, 6, 9];
///
/// let compressed = compress_all(Compression::GZip, &data).unwrap();
///
/// assert_eq!(decompress_all(Compression::GZip, &compressed).unwrap(), data);
/// ```
#[allow(clippy::module_name_repetitions)]
pub fn compress_all(compression: Compression, data: &[u8]) -> Result<Vec<u8>> {
    let mut destination = Vec::<u8>::new();

    {
        let mut writer = compress(compression, &mut destination)?;

        writer.write_all(data)?;

        writer.flush()?;
    }

    Ok(destination)
}

/// Returns a new instance of [`std::io::Read`] that will emit uncompressed data from an the underlying reader.
///
/// # Arguments
/// * `compression` - Compression to use
/// * `compressed_data` - Underlying reader with compressed data
///
/// # Errors
/// Will return [`Err`] if `compression` is not supported (see [`compress`]) or there was an
/// error while creating the zstd decoder.
pub fn decompress<'a>(
    compression: Compression,
    compressed_data: &'a mut impl Read,
) -> Result<Box<dyn Read + 'a>> {
    if !compression.is_supported() {
        return Err(Error::UnsupportedCompression(compression));
    }

    match compression {
        Compression::None => Ok(Box::new(compressed_data)),
        Compression::GZip => Ok(Box::new(GzDecoder::new(compressed_data))),
        Compression::Brotli => Ok(Box::new(BrotliDecoder::new(compressed_data, 4096))),
        #[cfg(not(target_arch = "wasm32"))]
        Compression::ZStd => Ok(Box::new(ZSTDDecoder::new(compressed_data)?)),
        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedCompression(compression)),
    }
}

/// Decompresses a byte slice and returns the result as a new [`Vec<u8>`].
///
/// # Arguments
/// * `compression` - Compression to use
/// * `data` - Data to decompress
///
/// # Errors
/// Will return [`Err`] if...
/// - `compression` is not supported
/// - there was an error while creating the zstd decoder
/// - `data` is not compressed correctly
///
pub fn decompress_all(compression: Compression, data: &[u8]) -> Result<Vec<u8>> {
    if compression == Compression::None {
        return Ok(data.to_vec());
    }

    let mut data_reader = Cursor::new(data);

    let mut reader = decompress(compression, &mut data_reader)?;

    let mut destination = Vec::<u8>::new();

    reader.read_to_end(&mut destination)?;

    Ok(destination)
}
