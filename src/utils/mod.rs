//! Utility helpers: JSON/YAML serializers and file loading.
pub mod serialization;

pub use serialization::DataFormat;
pub use serialization::FileSerializer;
pub use serialization::FileUtils;
pub use serialization::JsonSerializer;
pub use serialization::Serializer;
pub use serialization::YamlSerializer;
