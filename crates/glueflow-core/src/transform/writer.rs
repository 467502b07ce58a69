//! Parquet encoding of Arrow batches.

use crate::config::ParquetCompression;
use crate::error::TransformError;
use crate::Result;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Cursor;

/// Parquet codec for a configured compression.
pub fn codec(compression: &ParquetCompression) -> Compression {
    match compression {
        ParquetCompression::Snappy => Compression::SNAPPY,
        ParquetCompression::Gzip => Compression::GZIP(Default::default()),
        ParquetCompression::Lz4 => Compression::LZ4,
        ParquetCompression::Zstd => Compression::ZSTD(Default::default()),
        ParquetCompression::None => Compression::UNCOMPRESSED,
    }
}

/// Encode a batch as a complete Parquet file.
pub fn convert_to_parquet(
    batch: &RecordBatch,
    compression: &ParquetCompression,
    max_row_group_size: usize,
) -> Result<Bytes> {
    let mut buffer = Cursor::new(Vec::new());

    let props = WriterProperties::builder()
        .set_compression(codec(compression))
        .set_max_row_group_size(max_row_group_size.max(1))
        .set_write_batch_size(1024)
        .build();

    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props)).map_err(|e| {
        TransformError::ParquetWrite(format!("Failed to create Parquet writer: {}", e))
    })?;

    writer.write(batch).map_err(|e| {
        TransformError::ParquetWrite(format!("Failed to write batch to Parquet: {}", e))
    })?;

    writer.close().map_err(|e| {
        TransformError::ParquetWrite(format!("Failed to close Parquet writer: {}", e))
    })?;

    Ok(Bytes::from(buffer.into_inner()))
}
