//! Store-specific value coercion applied before writes.

use bson::{Bson, Document};
use ormbridge_proto::parse_datetime;
use tracing::warn;

use crate::model::{Model, PropertyType};

/// Normalize a record for storage.
///
/// Properties declared [`PropertyType::Datetime`] holding a non-empty date
/// string become native datetimes. Unparseable strings are left as they are.
pub fn format_for_store(model: &dyn Model, mut record: Document) -> Document {
    for (key, ty) in model.property_types() {
        if *ty != PropertyType::Datetime {
            continue;
        }
        let Some(Bson::String(text)) = record.get(key) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        match parse_datetime(text) {
            Some(dt) => {
                record.insert(
                    key.clone(),
                    Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis())),
                );
            }
            None => {
                warn!(model = model.name(), property = %key, value = %text, "unparseable datetime left unchanged");
            }
        }
    }
    record
}
