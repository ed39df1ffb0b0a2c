// Parquet writer configuration shared by all partition files.
//
// Uses ZSTD compression and dictionary encoding to minimize size while
// keeping partitions cheap to scan.

use ::parquet::basic::{Compression, ZstdLevel};
use ::parquet::file::properties::{EnabledStatistics, WriterProperties};
use std::sync::OnceLock;

fn compression_setting() -> Compression {
    Compression::ZSTD(ZstdLevel::try_new(2).unwrap_or_default())
}

/// Get shared writer properties (cached)
pub fn writer_properties() -> &'static WriterProperties {
    static PROPERTIES: OnceLock<WriterProperties> = OnceLock::new();
    PROPERTIES.get_or_init(|| {
        WriterProperties::builder()
            .set_dictionary_enabled(true)
            .set_statistics_enabled(EnabledStatistics::Page)
            .set_compression(compression_setting())
            .set_data_page_size_limit(256 * 1024) // 256 KiB data pages
            .set_write_batch_size(32 * 1024)
            .set_max_row_group_size(32 * 1024) // 32k rows per group
            .set_dictionary_page_size_limit(128 * 1024)
            .build()
    })
}
