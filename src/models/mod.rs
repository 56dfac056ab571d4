mod category;
mod classification;
mod domain_record;
mod session_record;

pub use category::{CategoryEntry, CategoryRegistry};
pub use classification::{
    load_overrides, save_overrides, set_override, Classification, ClassificationOverrides,
};
pub use domain_record::{DayBucket, DomainRecord};
pub use session_record::SessionRecord;
