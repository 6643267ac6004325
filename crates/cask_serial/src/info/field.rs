use alloc::string::String;

use crate::value::Value;

// -----------------------------------------------------------------------------
// FieldInfo

/// A named field of a struct or of one object layer.
///
/// # Examples
///
/// ```
/// use cask_serial::info::FieldInfo;
/// use cask_serial::value::Value;
///
/// let field = FieldInfo::new("retries", "u8").with_default(3_u8);
/// assert_eq!(field.initial_value(), Value::from(3_u8));
/// assert!(!field.is_skipped());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    name: String,
    type_name: String,
    default: Option<Value>,
    skip: bool,
}

impl FieldInfo {
    #[inline]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            default: None,
            skip: false,
        }
    }

    /// Value used when an archive lacks this field.
    #[inline]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Excludes the field from archives. It keeps its initial value on load.
    #[inline]
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type, used as the static type of the field's node.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    /// Whether a load must find this field in the archive.
    #[inline]
    pub fn is_required(&self) -> bool {
        !self.skip && self.default.is_none()
    }

    /// The default, or [`Value::Null`].
    #[inline]
    pub fn initial_value(&self) -> Value {
        self.default.clone().unwrap_or_default()
    }
}
