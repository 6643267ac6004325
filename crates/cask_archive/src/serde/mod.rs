//! `serde` support for archive trees.
//!
//! A node renders as a struct with the fields `kind`, `type`, `runtime_type`,
//! `base_type`, `key`, `id`, `length`, `value` and `children`; absent optional
//! fields and empty `children` are skipped. An archive renders as
//! `{ version, root }`.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use de::ArchiveParts;

const NODE_FIELDS: &[&str] = &[
    "kind",
    "type",
    "runtime_type",
    "base_type",
    "key",
    "id",
    "length",
    "value",
    "children",
];

const ARCHIVE_FIELDS: &[&str] = &["version", "root"];
