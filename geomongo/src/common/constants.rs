/// Identifier field of every saved document.
pub const DOC_ID: &str = "_id";

/// Separator of embedded field names.
pub const FIELD_SEPARATOR: &str = ".";

// GeoJSON wire keys
pub const GEOMETRY: &str = "geometry";
pub const PROPERTIES: &str = "properties";
pub const TYPE: &str = "type";
pub const COORDINATES: &str = "coordinates";
pub const GEOMETRIES: &str = "geometries";

/// Default geometry path of an ad-hoc collection.
pub const DEFAULT_GEOMETRY_PATH: &str = "loc";

/// Collections with this prefix are never exposed as feature types.
pub const SYSTEM_COLLECTION_PREFIX: &str = "system.";

// Native query operators
pub const OP_AND: &str = "$and";
pub const OP_OR: &str = "$or";
pub const OP_NOR: &str = "$nor";
pub const OP_LT: &str = "$lt";
pub const OP_LTE: &str = "$lte";
pub const OP_GT: &str = "$gt";
pub const OP_GTE: &str = "$gte";
pub const OP_WITHIN: &str = "$within";
pub const OP_BOX: &str = "$box";

// Connection defaults
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const STORE_DISPLAY_NAME: &str = "MongoDB";
pub const STORE_DESCRIPTION: &str = "MongoDB database";
