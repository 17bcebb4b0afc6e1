//! RecordService: schema-driven CRUD using the safe SQL builder.

mod records;
pub use records::RecordService;
